pub mod clock;
pub mod meal_book;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use meal_book::{BookSettings, CloseOutcome, CycleSelector, MealBook};
