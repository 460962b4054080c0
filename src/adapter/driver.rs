// 駆動する側アダプター（REST API）

pub mod admin_api;
pub mod catalog_api;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;
