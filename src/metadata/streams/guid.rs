//! The `#GUID` heap: 16 byte entries addressed by a 1-based index (ECMA-335 II.24.2.5).

use crate::Result;

const GUID_SIZE: usize = 16;

/// A view over the `#GUID` heap
///
/// ```rust
/// use cilmeta::metadata::streams::Guid;
///
/// let mut data = [0u8; 32];
/// data[16..].fill(0x5C);
/// let heap = Guid::from(&data)?;
/// assert_eq!(heap.count(), 2);
/// assert_eq!(heap.get(2)?, uguid::Guid::from_bytes([0x5C; 16]));
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Wrap the content of a `#GUID` stream; a partial trailing entry is ignored
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `data` holds less than one entry
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() < GUID_SIZE {
            return Err(malformed_error!(
                "#GUID heap of {} bytes holds no complete entry",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Number of complete entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / GUID_SIZE
    }

    /// Entry `index`, where 0 is the nil GUID
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index past [`Guid::count`]
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        let Some(slot) = index.checked_sub(1) else {
            return Ok(uguid::Guid::ZERO);
        };

        self.data
            .chunks_exact(GUID_SIZE)
            .nth(slot)
            .and_then(|bytes| <[u8; GUID_SIZE]>::try_from(bytes).ok())
            .map(uguid::Guid::from_bytes)
            .ok_or_else(|| out_of_bounds_error!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries() {
        let mvid = uguid::guid!("3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        let mut data = mvid.to_bytes().to_vec();
        data.extend_from_slice(&[0xFF; 16]);

        let heap = Guid::from(&data).unwrap();
        assert_eq!(heap.count(), 2);
        assert_eq!(heap.get(0).unwrap(), uguid::Guid::ZERO);
        assert_eq!(heap.get(1).unwrap(), mvid);
        assert_eq!(heap.get(2).unwrap(), uguid::Guid::from_bytes([0xFF; 16]));
        assert!(heap.get(3).is_err());
    }

    #[test]
    fn partial_entries() {
        let data = [0x42u8; 40];
        let heap = Guid::from(&data).unwrap();
        assert_eq!(heap.count(), 2);
        assert!(heap.get(3).is_err());

        assert!(Guid::from(&data[..12]).is_err());
        assert!(Guid::default().get(1).is_err());
    }
}
