pub mod mock_terminal;
