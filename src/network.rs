use crate::constants::REQUIRED_CHAIN_ID;

pub fn is_correct(chain_id: Option<u64>) -> bool {
    chain_id == Some(REQUIRED_CHAIN_ID)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkCheck {
    pub required_chain_id: u64,
    pub is_correct: bool,
}

impl NetworkCheck {
    pub fn from_chain_id(chain_id: Option<u64>) -> Self {
        Self {
            required_chain_id: REQUIRED_CHAIN_ID,
            is_correct: is_correct(chain_id),
        }
    }
}
