pub mod cpu;
pub mod load;
pub mod memory;
pub mod nginx;
