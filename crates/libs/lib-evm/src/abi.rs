//! # Contract Bindings
//!
//! Minimal ABI surface of the contracts the swap pipeline calls. Only the
//! methods actually used are declared.

use alloy::sol;

sol! {
    /// ERC-20 allowance, balance and approval.
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Wrapped native token (WETH9): native currency in, ERC-20 out.
    interface IWETH9 {
        function deposit() external payable;
    }

    /// Uniswap V3 factory. Returns the zero address when no pool exists.
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }

    /// Uniswap V3 pool immutables.
    interface IUniswapV3Pool {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function fee() external view returns (uint24);
    }

    /// QuoterV2. Not a view function: it simulates the swap and reverts internally,
    /// so it is only ever invoked through `eth_call`.
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (
                uint256 amountOut,
                uint160 sqrtPriceX96After,
                uint32 initializedTicksCrossed,
                uint256 gasEstimate
            );
    }

    /// SwapRouter02 single-hop exact-input swap.
    interface ISwapRouter02 {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params)
            external
            payable
            returns (uint256 amountOut);
    }
}
