//! Meal budget accounting: cycles, tallies, banking, and the state snapshot
//! those computations run over.

pub mod budget;
pub mod cycle;
pub mod meal;
pub mod report;
pub mod state;

pub use budget::{
    add_to_bank, borrow_from_bank, convert_vegetarian, leftovers, overage, progress_for, Bank,
    BorrowOutcome, BudgetLine, Credits, Goals, Progress,
};
pub use cycle::{
    compute_cycle, default_anchor, format_range, local_midnight, parse_timezone, Cycle,
    CycleClock, CYCLE_LENGTH_DAYS, DEFAULT_TIMEZONE,
};
pub use meal::{Meal, MealType};
pub use report::{meals_by_day, CycleReport, LineStatus};
pub use state::{parse_anchor, AppState, LedgerMeta};
