mod budget;
mod calendar;
mod category;
mod entry;
mod forecast;
mod frequency;
mod goal;
mod money;
mod schedule;

pub use budget::*;
pub use calendar::*;
pub use category::*;
pub use entry::*;
pub use forecast::*;
pub use frequency::*;
pub use goal::*;
pub use money::*;
pub use schedule::*;
