// ドメイン層
// 外部に依存しないビジネスルール

pub mod error;
pub mod model;
pub mod port;
pub mod service;
