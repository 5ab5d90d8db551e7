// 领域模块 - 用于组织账本的业务逻辑
//
// 记录领域负责三个集合的增删改，报告领域负责基于快照的汇总

pub mod records;
pub mod reports;

pub use records::{RecordDomain, RecordSnapshot};
pub use reports::ReportDomain;
