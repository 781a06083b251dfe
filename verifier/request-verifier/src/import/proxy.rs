//! Resolution of the implementation behind a proxy contract

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, B256, b256},
    sol_types::SolCall,
};
use tracing::debug;

use crate::{
    abi::interfaces::IProxy,
    rpc_gateway::{RpcGateway, error::RpcError},
    types::chain::ChainSpec,
};

// -------------
// | Constants |
// -------------

/// The EIP-1967 implementation slot,
/// `bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)`
const EIP1967_IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// The implementation slot of legacy OpenZeppelin proxies,
/// `keccak256("org.zeppelinos.proxy.implementation")`
const ZEPPELINOS_IMPLEMENTATION_SLOT: B256 =
    b256!("0x7050c9e0f4ca769c69bd3a8ef740bc37934f8e2c036e5a723fd8ee048ed3f8c3");
/// The EIP-1967 beacon slot,
/// `bytes32(uint256(keccak256("eip1967.proxy.beacon")) - 1)`
const EIP1967_BEACON_SLOT: B256 =
    b256!("0xa3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");

/// The implementation slots, in lookup order
const IMPLEMENTATION_SLOTS: [B256; 2] = [EIP1967_IMPLEMENTATION_SLOT, ZEPPELINOS_IMPLEMENTATION_SLOT];

// --------------
// | Resolution |
// --------------

/// Resolve the implementation address of a proxy.
///
/// Tries the implementation slots, then the beacon slot (asking the beacon
/// for its implementation), then the proxy's own `implementation()`. Returns
/// `None` if no lookup yields a non-zero address.
pub async fn resolve_implementation<G: RpcGateway>(
    rpc: &G,
    chain: &ChainSpec,
    proxy: Address,
) -> Result<Option<Address>, RpcError> {
    for slot in IMPLEMENTATION_SLOTS {
        let word = rpc.read_storage_slot(chain, proxy, slot).await?;
        if let Some(implementation) = word_to_address(word) {
            debug!("Resolved implementation {implementation:#x} of {proxy:#x} from slot {slot}");
            return Ok(Some(implementation));
        }
    }

    let beacon_word = rpc.read_storage_slot(chain, proxy, EIP1967_BEACON_SLOT).await?;
    if let Some(beacon) = word_to_address(beacon_word)
        && let Some(implementation) = call_implementation(rpc, chain, beacon).await
    {
        debug!("Resolved implementation {implementation:#x} of {proxy:#x} through beacon {beacon:#x}");
        return Ok(Some(implementation));
    }

    Ok(call_implementation(rpc, chain, proxy).await)
}

/// Call `implementation()` on a contract, treating a revert or a zero result
/// as no implementation
async fn call_implementation<G: RpcGateway>(rpc: &G, chain: &ChainSpec, contract: Address) -> Option<Address> {
    let call_data = IProxy::implementationCall {}.abi_encode().into();
    let result = rpc.call_readonly_function(chain, contract, call_data, &[DynSolType::Address]).await;

    match result.as_deref() {
        Ok([DynSolValue::Address(address)]) if !address.is_zero() => Some(*address),
        Ok(_) => None,
        Err(e) => {
            debug!("implementation() call on {contract:#x} failed: {e}");
            None
        },
    }
}

/// Interpret a storage word as an address, `None` for an empty slot
fn word_to_address(word: B256) -> Option<Address> {
    let address = Address::from_word(word);
    (!address.is_zero()).then_some(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rpc_gateway::mock_rpc_gateway::MockRpcGateway, test_utils::random_address};

    /// The implementation slot takes precedence over `implementation()`
    #[tokio::test]
    async fn test_resolve_from_slot() {
        let rpc = MockRpcGateway::default();
        let chain = ChainSpec::new(1);
        let proxy = random_address();
        let implementation = random_address();

        rpc.set_storage(proxy, ZEPPELINOS_IMPLEMENTATION_SLOT, implementation.into_word()).await;
        let call_data = IProxy::implementationCall {}.abi_encode().into();
        rpc.set_call_result(proxy, call_data, vec![DynSolValue::Address(random_address())]).await;

        let resolved = resolve_implementation(&rpc, &chain, proxy).await.unwrap();
        assert_eq!(resolved, Some(implementation));
    }

    /// A beacon is asked for its implementation
    #[tokio::test]
    async fn test_resolve_through_beacon() {
        let rpc = MockRpcGateway::default();
        let chain = ChainSpec::new(1);
        let proxy = random_address();
        let beacon = random_address();
        let implementation = random_address();

        rpc.set_storage(proxy, EIP1967_BEACON_SLOT, beacon.into_word()).await;
        let call_data = IProxy::implementationCall {}.abi_encode().into();
        rpc.set_call_result(beacon, call_data, vec![DynSolValue::Address(implementation)]).await;

        let resolved = resolve_implementation(&rpc, &chain, proxy).await.unwrap();
        assert_eq!(resolved, Some(implementation));
    }

    /// Nothing resolves for a contract without slots or a working
    /// `implementation()`
    #[tokio::test]
    async fn test_unresolvable() {
        let rpc = MockRpcGateway::default();
        let resolved = resolve_implementation(&rpc, &ChainSpec::new(1), random_address()).await.unwrap();

        assert_eq!(resolved, None);
    }
}
