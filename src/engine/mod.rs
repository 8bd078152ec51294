pub mod auto_scroll;
pub mod dispatcher;
pub mod drag_drop;
pub mod input;
pub mod scheduler;
pub mod selection;
