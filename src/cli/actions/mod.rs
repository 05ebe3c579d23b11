pub mod check;
pub mod hash;

#[derive(Debug)]
pub enum Action {
    Check(check::Args),
    Hash(hash::Args),
}
