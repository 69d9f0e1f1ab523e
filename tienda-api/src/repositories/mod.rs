//! Persistence for usuarios, clientes and ventas.
//!
//! Each table sits behind an async trait so services can be exercised
//! without a database. The `Mysql*` types are the production
//! implementations on top of [`Db`](zocalo_database::Db).

mod clientes;
mod usuarios;
mod ventas;

pub use clientes::{ClienteRepository, MysqlClienteRepository, search_statement};
pub use usuarios::{MysqlUsuarioRepository, UsuarioRepository, hash_password_field};
pub use ventas::{MysqlVentaRepository, VentaRepository};
