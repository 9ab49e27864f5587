//! Daily prize wheel.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IDailySpin {
        function getUserSpinInfo(address user) external view returns (uint256 lastSpinTimestamp, uint256 pendingRewards);
        function getPrize(address user) external view returns (uint256);
        function spin() external;
        function claim() external;
    }
}
