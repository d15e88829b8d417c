pub mod loan;
pub mod sensitivity;
