pub use accounts::Account;
pub use bank_accounts::BankAccount;
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{CreateListingCmd, GrantLoanCmd, TransferCmd};
pub use error::EngineError;
pub use inventory::{Inventory, MemoryInventory};
pub use listings::{ItemDescriptor, Listing, ListingStatus};
pub use loans::{Loan, LoanStatus};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, MarketFilter, Purchase};
pub use policy::{BankPolicy, EconomyPolicy, MarketPolicy};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use transactions::{LedgerTransaction, TransactionKind};

mod accounts;
mod bank_accounts;
mod clock;
mod commands;
mod error;
mod inventory;
mod listings;
mod loans;
mod money;
mod ops;
mod policy;
mod scheduler;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
