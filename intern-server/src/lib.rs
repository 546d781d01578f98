pub mod agents;
pub mod brain;
pub mod housekeeping;
pub mod http;
pub mod reader;
pub mod router;
