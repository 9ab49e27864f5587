//! Hourly freeroll and its once-a-day bonus wheel.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IFreeroll {
        function lastClaimed(address user) external view returns (uint256);
        function getUserRollInfo(address user) external view returns (uint256 roll, uint256 payout);
        function dailyRollCount(address user) external view returns (uint256);
        function lastRollTimestamp(address user) external view returns (uint256);
        function isEligibleForBonus(address user) external view returns (bool);
        function roll() external;
        function claimReward() external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IBonusWheel {
        function lastBonusSpinDay(address user) external view returns (uint256);
        function getPendingPrize(address user) external view returns (uint256 prizeIndex);
        function spin() external;
        function claim() external;
    }
}
