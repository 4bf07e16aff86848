pub mod storage_port;
