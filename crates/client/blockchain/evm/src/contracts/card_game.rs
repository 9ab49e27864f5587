//! 4x4 memory card game.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ICryptoCardGame {
        event CardFlipped(address indexed player, uint256 row, uint256 col, string symbol, bool isMatch, uint256 reward);

        function getSymbolHash(address player, uint256 row, uint256 col) external view returns (bytes32);
        function getPendingRewards(address player) external view returns (uint256);
        function getFlipsRemaining(address player) external view returns (uint256);
        function getFlipsUsed(address player) external view returns (uint256);
        function getLastFlip(address player) external view returns (uint256);
        function getMatchedCards(address player) external view returns (uint256[] rows, uint256[] cols);

        function shuffleBoard(bytes32[] symbolHashes) external;
        function flipCard(uint256 row, uint256 col, string symbol) external;
        function claimRewards() external;
    }
}
