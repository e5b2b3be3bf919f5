pub mod caisses;
pub mod clients;
pub mod credentials;
pub mod employees;
pub mod stores;
pub mod tickets;
pub mod validations;

pub use caisses as caisse_entity;
pub use clients as client_entity;
pub use credentials as credential_entity;
pub use employees as employee_entity;
pub use stores as store_entity;
pub use tickets as ticket_entity;
pub use validations as validation_entity;
