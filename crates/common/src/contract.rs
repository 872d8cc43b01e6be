//! ABI bindings of the payment contract and the token metadata interface.

use alloy_sol_types::sol;

sol! {
    /// The payment contract the dApp submits transfers through.
    ///
    /// Deployed separately; its address comes from configuration.
    interface PaymentGateway {
        /// Forwards the attached value to `recipient`.
        #[derive(Debug, PartialEq, Eq)]
        function sendEther(address recipient) external payable;

        /// Moves `amount` of `token` from the caller to `recipient`.
        #[derive(Debug, PartialEq, Eq)]
        function sendERC20(address token, address recipient, uint256 amount) external;

        /// Native balance held by the contract.
        function getBalance() external view returns (uint256);

        event EtherSent(address indexed from, address indexed to, uint256 amount);

        event TokenSent(
            address indexed token,
            address indexed from,
            address indexed to,
            uint256 amount
        );
    }
}

sol! {
    /// Optional metadata extension of a fungible token.
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}
