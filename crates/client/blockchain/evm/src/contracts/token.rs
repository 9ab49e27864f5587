//! Platform token: ERC-20 plus the tiered daily claim.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IGipieToken {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);

        function getLockStatus() external view returns (bool);
        function getUserClaimTier(address user) external view returns (uint256);
        function getRemainingCooldown(address user) external view returns (uint256);
        function getClaimTierConfig(uint256 tier) external view returns (uint256 dailyReward, uint256 upgradeCost);
        function claimDaily() external;
        function upgradeClaim(uint256 tier) external payable;
    }
}
