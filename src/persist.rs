//! The `.sb` binary save format.
//!
//! All integers are 4-byte big-endian signed, all reals 8-byte big-endian
//! IEEE-754 doubles:
//!
//! ```text
//! i32 name_len, name bytes (UTF-8)
//! i32 L (number of layers)
//! L x i32 activation codes (input layer first)
//! L x i32 layer sizes
//! weights of layers 1..L, each row-major (rows = size[l], cols = size[l-1])
//! biases of layers 1..L
//! ```
//!
//! [`SaveDir`] manages a directory of numbered save files (`0.sb`, `1.sb`, ...)
//! addressed by the network name stored inside each file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{ActivationFunction, Error, Matrix, Network, Result, Vector};

pub const SAVE_EXTENSION: &str = "sb";

/// Serialize `network` under `name`.
pub fn write_network<W: Write>(network: &Network, name: &str, mut out: W) -> Result<()> {
    let name_bytes = name.as_bytes();
    write_len(&mut out, name_bytes.len())?;
    out.write_all(name_bytes)?;

    write_len(&mut out, network.num_layers())?;
    for f in network.activation_functions() {
        out.write_all(&f.code().to_be_bytes())?;
    }
    for &size in network.layer_sizes() {
        write_len(&mut out, size)?;
    }
    for w in network.weights() {
        for &v in w.as_slice() {
            out.write_all(&v.to_be_bytes())?;
        }
    }
    for b in network.biases() {
        for &v in b.iter() {
            out.write_all(&v.to_be_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Deserialize a network; the stored name becomes the network's name.
pub fn read_network<R: Read>(mut input: R) -> Result<Network> {
    let name = read_name(&mut input)?;
    let num_layers = read_len(&mut input, "layer count")?;

    let mut functions = Vec::with_capacity(num_layers.min(1024));
    for _ in 0..num_layers {
        functions.push(ActivationFunction::from_code(read_i32(&mut input)?)?);
    }

    let mut layer_sizes = Vec::with_capacity(num_layers.min(1024));
    for _ in 0..num_layers {
        layer_sizes.push(read_len(&mut input, "layer size")?);
    }

    let mut weights = Vec::with_capacity(num_layers.saturating_sub(1));
    for w in layer_sizes.windows(2) {
        let (rows, cols) = (w[1], w[0]);
        let count = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::InvalidData("weight shape overflow".to_owned()))?;
        let data = read_f64s(&mut input, count)?;
        weights.push(Matrix::from_flat(rows, cols, data)?);
    }

    let mut biases = Vec::with_capacity(num_layers.saturating_sub(1));
    for &n in layer_sizes.iter().skip(1) {
        biases.push(Vector::from_vec(read_f64s(&mut input, n)?));
    }

    Network::from_parts(Some(name), layer_sizes, functions, weights, biases)
        .map_err(|e| Error::InvalidData(format!("save file describes an invalid network: {e}")))
}

/// Read only the name header of a save file.
pub fn read_name<R: Read>(input: &mut R) -> Result<String> {
    let len = read_len(input, "name length")?;
    let mut bytes = vec![0u8; len];
    read_exact(input, &mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidData(format!("network name is not valid UTF-8: {e}")))
}

/// Write `network` to `path`, replacing any existing file only once the new
/// contents are complete.
pub fn save<P: AsRef<Path>>(network: &Network, name: &str, path: P) -> Result<()> {
    replace_file(path.as_ref(), |out| write_network(network, name, out))
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
    let file = File::open(path.as_ref())?;
    read_network(BufReader::new(file))
}

/// Names may only contain letters, digits and underscores.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidConfig("network name must not be empty".to_owned()));
    }
    if let Some(c) = name.chars().find(|&c| !(c.is_alphanumeric() || c == '_')) {
        return Err(Error::InvalidConfig(format!(
            "network name may only contain letters, digits and underscores, found {c:?}"
        )));
    }
    Ok(())
}

/// A directory of numbered `.sb` save files, addressed by network name.
#[derive(Debug, Clone)]
pub struct SaveDir {
    root: PathBuf,
}

impl SaveDir {
    /// Open (and create if missing) a save directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `name`, if any.
    pub fn find(&self, name: &str) -> Result<Option<PathBuf>> {
        for (path, stored) in self.entries()? {
            if stored == name {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Names of every saved network, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.entries()?.into_iter().map(|(_, n)| n).collect();
        names.sort();
        Ok(names)
    }

    /// Save `network` as `name`, overwriting an existing save of that name.
    ///
    /// New saves take the lowest free `N.sb` file.
    pub fn save(&self, network: &Network, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = match self.find(name)? {
            Some(path) => path,
            None => self.next_free_path(),
        };
        save(network, name, &path)?;
        debug!(name, path = %path.display(), "saved network");
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Network> {
        let path = self
            .find(name)?
            .ok_or_else(|| Error::InvalidConfig(format!("no saved network named {name:?}")))?;
        let network = load(&path)?;
        debug!(name, path = %path.display(), "loaded network");
        Ok(network)
    }

    /// Delete the save holding `name`. Returns whether one existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        match self.find(name)? {
            Some(path) => {
                fs::remove_file(&path)?;
                debug!(name, path = %path.display(), "deleted network");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn next_free_path(&self) -> PathBuf {
        (0..)
            .map(|i| self.root.join(format!("{i}.{SAVE_EXTENSION}")))
            .find(|p| !p.exists())
            .unwrap_or_else(|| self.root.join(format!("0.{SAVE_EXTENSION}")))
    }

    fn entries(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let mut reader = BufReader::new(File::open(&path)?);
            out.push((path, read_name(&mut reader)?));
        }
        out.sort();
        Ok(out)
    }
}

/// Write through a temporary file in the target's directory, then rename it
/// over `path`. On error `path` is left untouched.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        write(&mut out)?;
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn write_len<W: Write>(out: &mut W, value: usize) -> Result<()> {
    let v = i32::try_from(value)
        .map_err(|_| Error::InvalidData(format!("{value} does not fit a 4-byte integer")))?;
    out.write_all(&v.to_be_bytes())?;
    Ok(())
}

fn read_exact<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<()> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::InvalidData("save file is truncated".to_owned())
        } else {
            Error::Io(e)
        }
    })
}

fn read_i32<R: Read>(input: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact(input, &mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_len<R: Read>(input: &mut R, what: &str) -> Result<usize> {
    let v = read_i32(input)?;
    usize::try_from(v).map_err(|_| Error::InvalidData(format!("negative {what}: {v}")))
}

fn read_f64s<R: Read>(input: &mut R, count: usize) -> Result<Vec<f64>> {
    // Sizes come from the file, so only trust them as far as the data goes.
    let mut out = Vec::with_capacity(count.min(1 << 16));
    let mut buf = [0u8; 8];
    for _ in 0..count {
        read_exact(input, &mut buf)?;
        out.push(f64::from_be_bytes(buf));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActivationFunction::*;

    fn tiny() -> Network {
        Network::from_parts(
            None,
            vec![2, 2, 1],
            vec![Identity, Sigmoid, Tanh],
            vec![
                Matrix::from_flat(2, 2, vec![1.0, -2.0, 0.5, 0.25]).unwrap(),
                Matrix::from_flat(1, 2, vec![3.0, -0.125]).unwrap(),
            ],
            vec![Vector::from_vec(vec![0.1, -0.1]), Vector::from_vec(vec![2.0])],
        )
        .unwrap()
    }

    #[test]
    fn byte_layout_is_big_endian() {
        let mut buf = Vec::new();
        write_network(&tiny(), "ab", &mut buf).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&[0, 0, 0, 2, b'a', b'b']);
        expected.extend_from_slice(&[0, 0, 0, 3]);
        expected.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 0, 0, 4]);
        expected.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 1]);
        // 1.0 as a big-endian double.
        expected.extend_from_slice(&[0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&buf[..expected.len()], expected.as_slice());

        // 4 + 2 + 4 + 12 + 12 header bytes, 6 weights, 3 biases.
        assert_eq!(buf.len(), 34 + 9 * 8);
    }

    #[test]
    fn read_restores_parameters_name_and_functions() {
        let net = tiny();
        let mut buf = Vec::new();
        write_network(&net, "digits_v1", &mut buf).unwrap();

        let loaded = read_network(buf.as_slice()).unwrap();
        assert_eq!(loaded, net);
        assert_eq!(loaded.name(), Some("digits_v1"));
        assert_eq!(loaded.activation_functions(), net.activation_functions());
    }

    #[test]
    fn truncated_and_corrupt_files_are_invalid_data() {
        let mut buf = Vec::new();
        write_network(&tiny(), "x", &mut buf).unwrap();

        let err = read_network(&buf[..buf.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)), "{err}");

        // Activation code of the first layer.
        let mut bad = buf.clone();
        bad[4 + 1 + 4 + 3] = 9;
        assert!(matches!(read_network(bad.as_slice()), Err(Error::InvalidData(_))));
    }

    #[test]
    fn failed_overwrite_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.sb");
        save(&tiny(), "kept", &path).unwrap();
        let before = fs::read(&path).unwrap();

        let err = replace_file(&path, |out| {
            out.write_all(&[0, 0, 0, 9, b'h'])?;
            Err(Error::InvalidData("write interrupted".to_owned()))
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        assert_eq!(fs::read(&path).unwrap(), before);
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(load(&path).unwrap().name(), Some("kept"));
    }

    #[test]
    fn names_are_restricted() {
        assert!(validate_name("net_01").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("my net").is_err());
        assert!(validate_name("../x").is_err());
    }
}
