//! Fixed-term token staking.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IStaking {
        function stakes(address user) external view returns (uint256 amount, uint256 startTime, uint256 endTime);
        function stake(uint256 amount, uint256 durationDays) external;
        function withdraw() external;
    }
}
