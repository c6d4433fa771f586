pub mod ledger;
pub mod tunnel_reservation;
