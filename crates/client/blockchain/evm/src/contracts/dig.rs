//! 5x5 treasure dig.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IDailyDig {
        event DigPerformed(address indexed player, uint256 row, uint256 col, bool foundPrize, uint256 prizeAmount);

        function getPlayerPeriodStatus(address player) external view returns (uint256 digsLeft, uint256 timeUntilNextReset, uint256 pendingRewards);
        function dig(uint256 row, uint256 col) external;
        function claimRewards() external;
    }
}
