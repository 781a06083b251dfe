//! Solidity interfaces of the contracts which asset and lock requests
//! interact with

use alloy::sol;

sol! {
    /// The subset of the ERC-20 interface used by asset requests
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    /// A disperse contract, sending assets to many recipients in one call
    interface IDisperse {
        function disperseEther(address[] recipients, uint256[] values) external payable;
        function disperseToken(address token, address[] recipients, uint256[] values) external;
    }

    /// A token lock contract
    interface ITokenLock {
        function lock(address token, uint256 amount, uint256 duration, string info, address unlockPrivilegeWallet) external;
    }

    /// The accessor exposed by upgradeable proxies
    interface IProxy {
        function implementation() external view returns (address);
    }
}
