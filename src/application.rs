// アプリケーション層
// ユースケースを実装し、ドメインモデルとポートを組み合わせる

pub mod error;
pub mod service;

pub use error::ApplicationError;
