use ethers::prelude::*;

abigen!(IERC20, "./abis/IERC20.json");

abigen!(ISwapSettlement, "./abis/SwapSettlement.json");
