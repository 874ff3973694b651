pub mod block;
pub mod entry;
pub mod observation;
pub mod phenology;
pub mod series;

pub use block::*;
pub use entry::*;
pub use observation::*;
pub use phenology::*;
pub use series::*;
