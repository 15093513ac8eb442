pub mod maintenance_dto;
pub mod trip_dto;
