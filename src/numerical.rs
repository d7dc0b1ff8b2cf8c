pub mod NR;
