pub mod ai;
pub mod block;
pub mod catalog;
pub mod kind;
