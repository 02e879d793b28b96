//! contract bindings and typed wrappers

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use lendguard_risk::{CollateralFactor, Pool, PoolId, Position};

use crate::error::{ClientError, Result};
use crate::provider::{Provider, TransactionReceipt, TransactionRequest};

sol! {
    interface IPool {
        function getAllPools() external view returns (bytes32[] memory);
        function getPoolInfo(bytes32 poolId) external view returns (
            address tokenA,
            address tokenB,
            uint256 reserveA,
            uint256 reserveB,
            uint256 totalLiquidity,
            uint256 totalBorrowedA,
            uint256 totalBorrowedB,
            uint256 interestRateA,
            uint256 interestRateB
        );
        function getUserPosition(address user, bytes32 poolId) external view returns (
            uint256 collateralA,
            uint256 collateralB,
            uint256 borrowedA,
            uint256 borrowedB
        );
        function COLLATERAL_FACTOR() external view returns (uint256);
        function getAmountOut(bytes32 poolId, address tokenIn, uint256 amountIn) external view returns (uint256);

        function createPool(address tokenA, address tokenB) external returns (bytes32);
        function addLiquidity(bytes32 poolId, uint256 amountA, uint256 amountB) external returns (uint256);
        function removeLiquidity(bytes32 poolId, uint256 liquidity) external returns (uint256, uint256);
        function swap(bytes32 poolId, address tokenIn, uint256 amountIn, uint256 minAmountOut) external returns (uint256);
        function depositCollateral(bytes32 poolId, address token, uint256 amount) external;
        function withdrawCollateral(bytes32 poolId, address token, uint256 amount) external;
        function borrow(bytes32 poolId, address token, uint256 amount) external;
        function repay(bytes32 poolId, address token, uint256 amount) external;
    }

    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface ICallback {
        function setupProtection(
            bytes32 poolId,
            uint256 threshold,
            uint256 target,
            address collateralToken,
            uint256 maxAmount
        ) external;
    }
}

/// `eth_call` and decode the return tuple
pub async fn read<P, C>(provider: &P, to: Address, call: C) -> Result<C::Return>
where
    P: Provider + ?Sized,
    C: SolCall + Send,
{
    let out = provider.call(to, Bytes::from(call.abi_encode())).await?;
    Ok(C::abi_decode_returns(&out, true)?)
}

/// send a call as a transaction and wait for it to be mined
pub async fn write<P, C>(provider: &P, to: Address, call: C) -> Result<TransactionReceipt>
where
    P: Provider + ?Sized,
    C: SolCall + Send,
{
    let tx = TransactionRequest::call(provider.sender(), to, call.abi_encode());
    provider.send_and_confirm(tx).await
}

/// deploy creation `bytecode` with abi-encoded constructor arguments
/// appended, paying `value` to the constructor
pub async fn deploy_contract<P>(provider: &P, bytecode: &[u8], constructor_args: &[u8], value: U256) -> Result<Address>
where
    P: Provider + ?Sized,
{
    let mut code = Vec::with_capacity(bytecode.len() + constructor_args.len());
    code.extend_from_slice(bytecode);
    code.extend_from_slice(constructor_args);

    let tx = TransactionRequest::deploy(provider.sender(), code, value);
    let receipt = provider.send_and_confirm(tx).await?;
    receipt.contract_address.ok_or_else(|| {
        ClientError::TransactionFailed(format!(
            "no contract address in receipt {}",
            receipt.transaction_hash
        ))
    })
}

/// the lending / swap pool
pub struct PoolContract<P> {
    address: Address,
    provider: P,
}

impl<P: Provider> PoolContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn get_all_pools(&self) -> Result<Vec<PoolId>> {
        Ok(read(&self.provider, self.address, IPool::getAllPoolsCall {}).await?._0)
    }

    pub async fn get_pool_info(&self, pool_id: PoolId) -> Result<Pool> {
        let r = read(&self.provider, self.address, IPool::getPoolInfoCall { poolId: pool_id }).await?;
        Ok(Pool {
            token_a: r.tokenA,
            token_b: r.tokenB,
            reserve_a: r.reserveA,
            reserve_b: r.reserveB,
            total_liquidity: r.totalLiquidity,
            total_borrowed_a: r.totalBorrowedA,
            total_borrowed_b: r.totalBorrowedB,
            interest_rate_a: r.interestRateA,
            interest_rate_b: r.interestRateB,
        })
    }

    pub async fn get_user_position(&self, user: Address, pool_id: PoolId) -> Result<Position> {
        let r = read(
            &self.provider,
            self.address,
            IPool::getUserPositionCall { user, poolId: pool_id },
        )
        .await?;
        Ok(Position {
            collateral_a: r.collateralA,
            collateral_b: r.collateralB,
            borrowed_a: r.borrowedA,
            borrowed_b: r.borrowedB,
        })
    }

    /// protocol-wide collateral factor, stored on chain as a percentage
    pub async fn collateral_factor(&self) -> Result<CollateralFactor> {
        let percent = read(&self.provider, self.address, IPool::COLLATERAL_FACTORCall {}).await?._0;
        Ok(CollateralFactor::from_percent(percent)?)
    }

    pub async fn get_amount_out(&self, pool_id: PoolId, token_in: Address, amount_in: U256) -> Result<U256> {
        let call = IPool::getAmountOutCall {
            poolId: pool_id,
            tokenIn: token_in,
            amountIn: amount_in,
        };
        Ok(read(&self.provider, self.address, call).await?._0)
    }

    pub async fn create_pool(&self, token_a: Address, token_b: Address) -> Result<B256> {
        let call = IPool::createPoolCall {
            tokenA: token_a,
            tokenB: token_b,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn add_liquidity(&self, pool_id: PoolId, amount_a: U256, amount_b: U256) -> Result<B256> {
        let call = IPool::addLiquidityCall {
            poolId: pool_id,
            amountA: amount_a,
            amountB: amount_b,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn remove_liquidity(&self, pool_id: PoolId, liquidity: U256) -> Result<B256> {
        let call = IPool::removeLiquidityCall {
            poolId: pool_id,
            liquidity,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn swap(&self, pool_id: PoolId, token_in: Address, amount_in: U256, min_amount_out: U256) -> Result<B256> {
        let call = IPool::swapCall {
            poolId: pool_id,
            tokenIn: token_in,
            amountIn: amount_in,
            minAmountOut: min_amount_out,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn deposit_collateral(&self, pool_id: PoolId, token: Address, amount: U256) -> Result<B256> {
        let call = IPool::depositCollateralCall {
            poolId: pool_id,
            token,
            amount,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn withdraw_collateral(&self, pool_id: PoolId, token: Address, amount: U256) -> Result<B256> {
        let call = IPool::withdrawCollateralCall {
            poolId: pool_id,
            token,
            amount,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn borrow(&self, pool_id: PoolId, token: Address, amount: U256) -> Result<B256> {
        let call = IPool::borrowCall {
            poolId: pool_id,
            token,
            amount,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }

    pub async fn repay(&self, pool_id: PoolId, token: Address, amount: U256) -> Result<B256> {
        let call = IPool::repayCall {
            poolId: pool_id,
            token,
            amount,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }
}

/// erc-20 reads and approvals for any token address
pub struct Erc20Client<P> {
    provider: P,
}

impl<P: Provider> Erc20Client<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn name(&self, token: Address) -> Result<String> {
        Ok(read(&self.provider, token, IERC20::nameCall {}).await?._0)
    }

    pub async fn symbol(&self, token: Address) -> Result<String> {
        Ok(read(&self.provider, token, IERC20::symbolCall {}).await?._0)
    }

    pub async fn decimals(&self, token: Address) -> Result<u8> {
        Ok(read(&self.provider, token, IERC20::decimalsCall {}).await?._0)
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(read(&self.provider, token, IERC20::balanceOfCall { owner }).await?._0)
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(read(&self.provider, token, IERC20::allowanceCall { owner, spender }).await?._0)
    }

    pub async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        let receipt = write(&self.provider, token, IERC20::approveCall { spender, amount }).await?;
        tracing::info!("approved {} of {} for {}", amount, token, spender);
        Ok(receipt.transaction_hash)
    }
}

/// callback contract deployed by the protection workflow
pub struct CallbackContract<P> {
    address: Address,
    provider: P,
}

impl<P: Provider> CallbackContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }

    pub async fn setup_protection(
        &self,
        pool_id: PoolId,
        threshold: U256,
        target: U256,
        collateral_token: Address,
        max_amount: U256,
    ) -> Result<B256> {
        let call = ICallback::setupProtectionCall {
            poolId: pool_id,
            threshold,
            target,
            collateralToken: collateral_token,
            maxAmount: max_amount,
        };
        Ok(write(&self.provider, self.address, call).await?.transaction_hash)
    }
}
