/// Ethereum paths need at least purpose, coin type and account
pub const MIN_ETHEREUM_PATH_LENGTH: usize = 3;

pub const SIGN_TX_LABEL: &str = "Sign #NETWORK transaction";
