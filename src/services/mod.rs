pub mod dispatcher;
pub mod loader;
pub mod observer;
pub mod personalizer;
pub mod reporter;

pub use dispatcher::Dispatcher;
pub use loader::{LoadError, RecipientLoader};
pub use observer::{DispatchObserver, DispatchWarning, TracingObserver};
pub use personalizer::{Rendered, personalize};
pub use reporter::{PersistError, Report, Reporter};
