//! ERC20 token contract bindings.
//!
//! Only the read-only surface is bound; calls are ABI-encoded here and
//! dispatched through a plain JSON-RPC `eth_call`.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall};

sol! {
    /// Read-only ERC20 token interface
    interface IERC20 {
        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Call data for `balanceOf(holder)`: the 4-byte selector followed by the
/// holder address left-padded to 32 bytes.
pub fn balance_of_calldata(holder: Address) -> Bytes {
    IERC20::balanceOfCall { account: holder }.abi_encode().into()
}
