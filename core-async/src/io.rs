//! Async I/O traits used when streaming response bodies to disk.

pub use tokio::io::{
    copy, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
