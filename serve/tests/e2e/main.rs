//! End-to-end tests: a real server on 127.0.0.1:0 driven through `questline::HttpBackend`.

mod autoplay;
mod common;
mod init_logging;
mod manual_play;
mod routes;
