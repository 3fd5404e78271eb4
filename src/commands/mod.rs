pub mod dumpmap;
pub mod loadmap;
pub mod processupdates;
