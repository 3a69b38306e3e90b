//! Recording and replaying list diffs.
//!
//! The JSON format is one serialized [`ListDiff`] per line, the binary format
//! a little-endian `u64` length followed by the bincode encoding of the diff.

use {
    crate::{
        error::ViewError,
        view::{
            list::{ListDiff, ListView},
            Observer,
        },
    },
    async_std::{
        io::{Read, ReadExt},
        stream::StreamExt,
    },
    serde::{de::DeserializeOwned, Serialize},
    std::{io::Write, marker::PhantomData, sync::Mutex},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Observer writing every diff of a list as a JSON line.
pub struct JsonDiffWriter<T, W>
where
    W: Write + Send,
{
    out: Mutex<W>,
    _phantom: PhantomData<fn(&T)>,
}

impl<T, W> JsonDiffWriter<T, W>
where
    T: Serialize,
    W: Write + Send,
{
    pub fn new(out: W) -> Self {
        JsonDiffWriter {
            out: Mutex::new(out),
            _phantom: PhantomData,
        }
    }

    fn write(&self, diff: &ListDiff<T>) -> Result<(), ViewError> {
        let mut out = self.out.lock().unwrap();
        serde_json::to_writer(&mut *out, diff)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

impl<T, W> JsonDiffWriter<T, W>
where
    W: Write + Send + Default,
{
    /// Takes everything written so far.
    pub fn take_output(&self) -> W {
        std::mem::take(&mut *self.out.lock().unwrap())
    }
}

impl<T, W> Observer<dyn ListView<T>> for JsonDiffWriter<T, W>
where
    T: Clone + Serialize + Send + Sync + 'static,
    W: Write + Send,
{
    fn notify(&self, diff: &ListDiff<T>) {
        if let Err(err) = self.write(diff) {
            log::error!("failed to record list diff: {}", err);
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Observer writing every diff of a list as a length-prefixed bincode frame.
pub struct BinDiffWriter<T, W>
where
    W: Write + Send,
{
    out: Mutex<W>,
    _phantom: PhantomData<fn(&T)>,
}

impl<T, W> BinDiffWriter<T, W>
where
    T: Serialize,
    W: Write + Send,
{
    pub fn new(out: W) -> Self {
        BinDiffWriter {
            out: Mutex::new(out),
            _phantom: PhantomData,
        }
    }

    fn write(&self, diff: &ListDiff<T>) -> Result<(), ViewError> {
        let size = bincode::serialized_size(diff)?;
        let bytes = bincode::serialize(diff)?;

        let mut out = self.out.lock().unwrap();
        out.write_all(&size.to_le_bytes())?;
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }
}

impl<T, W> BinDiffWriter<T, W>
where
    W: Write + Send + Default,
{
    pub fn take_output(&self) -> W {
        std::mem::take(&mut *self.out.lock().unwrap())
    }
}

impl<T, W> Observer<dyn ListView<T>> for BinDiffWriter<T, W>
where
    T: Clone + Serialize + Send + Sync + 'static,
    W: Write + Send,
{
    fn notify(&self, diff: &ListDiff<T>) {
        if let Err(err) = self.write(diff) {
            log::error!("failed to record list diff: {}", err);
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Decodes a complete binary diff log.
pub fn read_bin<T: DeserializeOwned>(mut bytes: &[u8]) -> Result<Vec<ListDiff<T>>, ViewError> {
    let mut diffs = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < 8 {
            return Err(truncated());
        }
        let (head, rest) = bytes.split_at(8);
        let mut size = [0u8; 8];
        size.copy_from_slice(head);
        let size = u64::from_le_bytes(size) as usize;
        if rest.len() < size {
            return Err(truncated());
        }

        let (frame, rest) = rest.split_at(size);
        diffs.push(bincode::deserialize(frame)?);
        bytes = rest;
    }
    Ok(diffs)
}

fn truncated() -> ViewError {
    ViewError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "truncated diff frame",
    ))
}

/// Applies a JSON diff log read from `read` to `mirror`, returning how many
/// diffs were applied.
pub async fn replay_json<T, R>(mirror: &mut Vec<T>, read: R) -> Result<usize, ViewError>
where
    T: DeserializeOwned + Clone,
    R: Read + Unpin,
{
    let mut bytes = read.bytes();
    let mut line = Vec::new();
    let mut applied = 0;

    while let Some(byte) = bytes.next().await {
        match byte? {
            b'\n' => applied += apply_line(mirror, &mut line)?,
            b => line.push(b),
        }
    }
    applied += apply_line(mirror, &mut line)?;

    Ok(applied)
}

fn apply_line<T>(mirror: &mut Vec<T>, line: &mut Vec<u8>) -> Result<usize, ViewError>
where
    T: DeserializeOwned + Clone,
{
    if line.iter().all(u8::is_ascii_whitespace) {
        line.clear();
        return Ok(0);
    }

    let diff: ListDiff<T> = serde_json::from_slice(line)?;
    line.clear();
    diff.apply_to(mirror)?;
    Ok(1)
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
