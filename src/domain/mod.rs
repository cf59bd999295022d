//! Storage records: the job load and the per-minion return.
//!
//! Both records serialize to JSON with the wire field names the host
//! dispatcher uses (`id`, `jid`, `fun`, `return`, `tgt`, `tgt_type`,
//! `minions`, `syndics`); fields this crate does not model are carried
//! through losslessly via flattened maps.

pub mod load;
pub mod record;

pub use load::JobLoad;
pub use record::ReturnRecord;
