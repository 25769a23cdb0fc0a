//! Sequences: fixed arrays, vectors, strings and maps.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::{Read, Write};
use std::task::Poll;

use hnet_transport::{send_exact, PartialRead};

use tracing::trace;

use crate::codec::{
    check_zero_width, read_len, read_run, wire_len, write_len, BulkState, ByteState, Codec,
    MAX_PREALLOC,
};
use crate::desc::TypeDesc;
use crate::error::{CodecError, Result};

/// Resumable progress through a run of `T`.
///
/// Dynamic sequences start in `Len`; fixed arrays skip straight to the
/// element phase. Bulk-width elements arrive as one byte run, everything
/// else one element state at a time.
pub enum SeqState<T: Codec> {
    Len(ByteState<8>),
    Bulk {
        len: usize,
        bytes: BulkState,
    },
    Elements {
        len: usize,
        items: Vec<T>,
        elem: T::DecodeState,
    },
    Done,
}

impl<T: Codec> SeqState<T> {
    fn start() -> Self {
        Self::Len(ByteState::new())
    }

    /// Element phase for `len` items, checking the byte size fits.
    fn for_len(len: usize) -> Result<Self> {
        check_zero_width::<T>(len)?;
        if len > MAX_PREALLOC {
            trace!(len, "large sequence announced; buffer grows as bytes arrive");
        }
        match T::BULK_WIDTH {
            Some(width) => {
                let total = len
                    .checked_mul(width)
                    .ok_or(CodecError::LengthOverflow(len as u64))?;
                Ok(Self::Bulk {
                    len,
                    bytes: BulkState::new(total),
                })
            }
            None => Ok(Self::Elements {
                len,
                items: Vec::with_capacity(len.min(MAX_PREALLOC)),
                elem: T::prepare(),
            }),
        }
    }
}

/// Drive a sequence decode as far as the available bytes allow.
fn resume_seq<S, T>(src: &mut S, state: &mut SeqState<T>) -> Result<Poll<Vec<T>>>
where
    S: PartialRead + ?Sized,
    T: Codec,
{
    loop {
        match state {
            SeqState::Len(prefix) => {
                if !prefix.fill(src)? {
                    return Ok(Poll::Pending);
                }
                let len = wire_len(u64::from_ne_bytes(prefix.bytes()))?;
                *state = SeqState::for_len(len)?;
            }
            SeqState::Bulk { len, bytes } => {
                if !bytes.fill(src)? {
                    return Ok(Poll::Pending);
                }
                let items = decode_bulk(*len, bytes.as_slice())?;
                *state = SeqState::Done;
                return Ok(Poll::Ready(items));
            }
            SeqState::Elements { len, items, elem } => {
                while items.len() < *len {
                    match T::resume(src, elem)? {
                        Poll::Ready(item) => {
                            items.push(item);
                            *elem = T::prepare();
                        }
                        Poll::Pending => return Ok(Poll::Pending),
                    }
                }
                let items = std::mem::take(items);
                *state = SeqState::Done;
                return Ok(Poll::Ready(items));
            }
            SeqState::Done => return Err(CodecError::ResumeAfterComplete),
        }
    }
}

fn decode_bulk<T: Codec>(len: usize, mut bytes: &[u8]) -> Result<Vec<T>> {
    let mut items = Vec::with_capacity(len.min(bytes.len()));
    for _ in 0..len {
        items.push(T::read(&mut bytes)?);
    }
    Ok(items)
}

fn write_items<T: Codec, W: Write + ?Sized>(items: &[T], w: &mut W) -> Result<()> {
    match T::BULK_WIDTH {
        Some(width) => {
            let mut run = Vec::with_capacity(items.len().saturating_mul(width));
            for item in items {
                item.write(&mut run)?;
            }
            send_exact(w, &run)?;
        }
        None => {
            for item in items {
                item.write(w)?;
            }
        }
    }
    Ok(())
}

fn read_items<T: Codec, R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<T>> {
    check_zero_width::<T>(len)?;
    match T::BULK_WIDTH {
        Some(width) => {
            let total = len
                .checked_mul(width)
                .ok_or(CodecError::LengthOverflow(len as u64))?;
            decode_bulk(len, &read_run(r, total)?)
        }
        None => {
            let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
            for _ in 0..len {
                items.push(T::read(r)?);
            }
            Ok(items)
        }
    }
}

impl<T: Codec> Codec for Vec<T> {
    type DecodeState = SeqState<T>;

    fn describe() -> TypeDesc {
        TypeDesc::array(T::describe())
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len())?;
        write_items(self, w)
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        read_items(r, len)
    }

    fn prepare() -> Self::DecodeState {
        SeqState::start()
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        resume_seq(src, state)
    }
}

impl<T: Codec, const N: usize> Codec for [T; N] {
    type DecodeState = SeqState<T>;

    const BULK_WIDTH: Option<usize> = match T::BULK_WIDTH {
        Some(width) => Some(width * N),
        None => None,
    };

    const ZERO_WIDTH: bool = N == 0 || T::ZERO_WIDTH;

    fn describe() -> TypeDesc {
        TypeDesc::fixed_array(T::describe(), N as u64)
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_items(self, w)
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        into_array(read_items(r, N)?)
    }

    fn prepare() -> Self::DecodeState {
        match T::BULK_WIDTH {
            Some(width) => SeqState::Bulk {
                len: N,
                bytes: BulkState::new(N.saturating_mul(width)),
            },
            None => SeqState::Elements {
                len: N,
                items: Vec::with_capacity(N.min(MAX_PREALLOC)),
                elem: T::prepare(),
            },
        }
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        match resume_seq(src, state)? {
            Poll::Ready(items) => into_array(items).map(Poll::Ready),
            Poll::Pending => Ok(Poll::Pending),
        }
    }
}

fn into_array<T, const N: usize>(items: Vec<T>) -> Result<[T; N]> {
    items
        .try_into()
        .map_err(|items: Vec<T>| CodecError::LengthOverflow(items.len() as u64))
}

/// Strings travel as a length prefix and raw UTF-8 bytes, no terminator.
impl Codec for String {
    type DecodeState = SeqState<u8>;

    fn describe() -> TypeDesc {
        TypeDesc::array(TypeDesc::prim("char"))
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len())?;
        send_exact(w, self.as_bytes())?;
        Ok(())
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        Ok(String::from_utf8(read_run(r, len)?)?)
    }

    fn prepare() -> Self::DecodeState {
        SeqState::start()
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        loop {
            match state {
                SeqState::Len(prefix) => {
                    if !prefix.fill(src)? {
                        return Ok(Poll::Pending);
                    }
                    let len = wire_len(u64::from_ne_bytes(prefix.bytes()))?;
                    *state = SeqState::Bulk {
                        len,
                        bytes: BulkState::new(len),
                    };
                }
                SeqState::Bulk { bytes, .. } => {
                    if !bytes.fill(src)? {
                        return Ok(Poll::Pending);
                    }
                    let bytes = std::mem::replace(bytes, BulkState::new(0)).into_inner();
                    *state = SeqState::Done;
                    return Ok(Poll::Ready(String::from_utf8(bytes)?));
                }
                SeqState::Elements { .. } | SeqState::Done => {
                    return Err(CodecError::ResumeAfterComplete)
                }
            }
        }
    }
}

/// Resumable progress through a map: a length, then key/value entries.
pub enum MapState<K: Codec, V: Codec, M> {
    Len(ByteState<8>),
    Entries {
        remaining: usize,
        map: M,
        entry: <(K, V) as Codec>::DecodeState,
    },
    Done,
}

fn write_map<'a, K, V, W>(
    w: &mut W,
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Result<()>
where
    K: Codec + 'a,
    V: Codec + 'a,
    W: Write + ?Sized,
{
    write_len(w, len)?;
    for (k, v) in entries {
        k.write(w)?;
        v.write(w)?;
    }
    Ok(())
}

fn read_map<K, V, M, R>(
    r: &mut R,
    new: impl FnOnce(usize) -> M,
    mut insert: impl FnMut(&mut M, K, V),
) -> Result<M>
where
    K: Codec,
    V: Codec,
    R: Read + ?Sized,
{
    let len = read_len(r)?;
    check_zero_width::<(K, V)>(len)?;
    let mut map = new(len.min(MAX_PREALLOC));
    for _ in 0..len {
        let (k, v) = <(K, V)>::read(r)?;
        insert(&mut map, k, v);
    }
    Ok(map)
}

fn resume_map<K, V, M, S>(
    src: &mut S,
    state: &mut MapState<K, V, M>,
    new: impl FnOnce(usize) -> M,
    mut insert: impl FnMut(&mut M, K, V),
) -> Result<Poll<M>>
where
    K: Codec,
    V: Codec,
    S: PartialRead + ?Sized,
{
    let mut new = Some(new);
    loop {
        match state {
            MapState::Len(prefix) => {
                if !prefix.fill(src)? {
                    return Ok(Poll::Pending);
                }
                let remaining = wire_len(u64::from_ne_bytes(prefix.bytes()))?;
                check_zero_width::<(K, V)>(remaining)?;
                let new = new.take().ok_or(CodecError::ResumeAfterComplete)?;
                *state = MapState::Entries {
                    remaining,
                    map: new(remaining.min(MAX_PREALLOC)),
                    entry: <(K, V)>::prepare(),
                };
            }
            MapState::Entries {
                remaining,
                map,
                entry,
            } => {
                while *remaining > 0 {
                    match <(K, V)>::resume(src, entry)? {
                        Poll::Ready((k, v)) => {
                            insert(map, k, v);
                            *remaining -= 1;
                            *entry = <(K, V)>::prepare();
                        }
                        Poll::Pending => return Ok(Poll::Pending),
                    }
                }
                return match std::mem::replace(state, MapState::Done) {
                    MapState::Entries { map, .. } => Ok(Poll::Ready(map)),
                    _ => Err(CodecError::ResumeAfterComplete),
                };
            }
            MapState::Done => return Err(CodecError::ResumeAfterComplete),
        }
    }
}

/// Maps travel as arrays of `(key, value)` pairs; a repeated key keeps the
/// last value.
impl<K: Codec + Ord, V: Codec> Codec for BTreeMap<K, V> {
    type DecodeState = MapState<K, V, Self>;

    fn describe() -> TypeDesc {
        TypeDesc::array(<(K, V)>::describe())
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_map(w, self.len(), self.iter())
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        read_map(r, |_| BTreeMap::new(), |map, k, v| {
            map.insert(k, v);
        })
    }

    fn prepare() -> Self::DecodeState {
        MapState::Len(ByteState::new())
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        resume_map(src, state, |_| BTreeMap::new(), |map, k, v| {
            map.insert(k, v);
        })
    }
}

impl<K, V, H> Codec for HashMap<K, V, H>
where
    K: Codec + Eq + Hash,
    V: Codec,
    H: BuildHasher + Default,
{
    type DecodeState = MapState<K, V, Self>;

    fn describe() -> TypeDesc {
        TypeDesc::array(<(K, V)>::describe())
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_map(w, self.len(), self.iter())
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        read_map(
            r,
            |cap| HashMap::with_capacity_and_hasher(cap, H::default()),
            |map, k, v| {
                map.insert(k, v);
            },
        )
    }

    fn prepare() -> Self::DecodeState {
        MapState::Len(ByteState::new())
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        resume_map(
            src,
            state,
            |cap| HashMap::with_capacity_and_hasher(cap, H::default()),
            |map, k, v| {
                map.insert(k, v);
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes, to_bytes, MAX_ZERO_WIDTH_LEN};
    use crate::testing::{assert_roundtrip, resume_all, split, Chunked};

    #[test]
    fn vectors_roundtrip() {
        assert_roundtrip(&Vec::<i32>::new());
        assert_roundtrip(&vec![1i32, -2, 3]);
        assert_roundtrip(&vec![String::from("a"), String::new(), String::from("ccc")]);
        assert_roundtrip(&vec![vec![1u8], vec![], vec![2, 3]]);
        assert_roundtrip(&vec![(), (), ()]);
    }

    #[test]
    fn vector_layout_is_length_then_run() {
        let bytes = to_bytes(&vec![7u16, 9]).unwrap();
        let mut expected = 2u64.to_ne_bytes().to_vec();
        expected.extend_from_slice(&7u16.to_ne_bytes());
        expected.extend_from_slice(&9u16.to_ne_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn arrays_roundtrip() {
        assert_roundtrip(&[1.5f64, 2.5, -3.0]);
        assert_roundtrip(&[String::from("x"), String::from("yz")]);
        assert_roundtrip(&[[1u8, 2], [3, 4]]);
        assert_roundtrip(&[0u32; 0]);
        assert_eq!(<[[u8; 2]; 3]>::BULK_WIDTH, Some(6));
        assert_eq!(to_bytes(&[1u8, 2, 3]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn strings_roundtrip() {
        assert_roundtrip(&String::new());
        assert_roundtrip(&String::from("hello, hnet"));
        assert_roundtrip(&"\u{e9}t\u{e9}".to_string());
    }

    #[test]
    fn long_string_spans_many_chunks() {
        let long: String = "abcdefghij".repeat(2_000);
        let bytes = to_bytes(&long).unwrap();
        assert_eq!(resume_all::<String>(split(&bytes, 1000)), long);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut bytes = 2u64.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            from_bytes::<String>(&bytes),
            Err(CodecError::InvalidUtf8(_))
        ));

        let mut state = String::prepare();
        let mut src = Chunked::new(vec![bytes]);
        assert!(matches!(
            String::resume(&mut src, &mut state),
            Err(CodecError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn huge_announced_length_does_not_preallocate() {
        let bytes = (u64::MAX / 16).to_ne_bytes().to_vec();
        let mut state = Vec::<u64>::prepare();
        let mut src = Chunked::new(vec![bytes]);
        let poll = Vec::<u64>::resume(&mut src, &mut state);
        if cfg!(target_pointer_width = "64") {
            assert!(matches!(poll, Ok(Poll::Pending)));
            match &state {
                SeqState::Bulk { bytes, .. } => assert_eq!(bytes.filled(), 0),
                _ => panic!("expected bulk phase"),
            }
        }
    }

    #[test]
    fn byte_size_overflow_is_reported() {
        let bytes = u64::MAX.to_ne_bytes().to_vec();
        let err = from_bytes::<Vec<u32>>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::LengthOverflow(_)));
    }

    #[test]
    fn zero_width_elements_are_capped() {
        let over = MAX_ZERO_WIDTH_LEN as u64 + 1;
        let bytes = over.to_ne_bytes().to_vec();
        assert!(matches!(
            from_bytes::<Vec<()>>(&bytes),
            Err(CodecError::ZeroWidthRun(n)) if n == over
        ));
        assert!(matches!(
            from_bytes::<BTreeMap<(), ()>>(&bytes),
            Err(CodecError::ZeroWidthRun(_))
        ));

        let mut state = Vec::<((), [u8; 0])>::prepare();
        let mut src = Chunked::new(vec![bytes.clone()]);
        assert!(matches!(
            Vec::<((), [u8; 0])>::resume(&mut src, &mut state),
            Err(CodecError::ZeroWidthRun(_))
        ));

        let mut state = HashMap::<(), ()>::prepare();
        let mut src = Chunked::new(vec![bytes]);
        assert!(matches!(
            HashMap::<(), ()>::resume(&mut src, &mut state),
            Err(CodecError::ZeroWidthRun(_))
        ));
    }

    #[test]
    fn zero_width_runs_up_to_the_cap_decode() {
        let bytes = (MAX_ZERO_WIDTH_LEN as u64).to_ne_bytes().to_vec();
        let units: Vec<()> = from_bytes(&bytes).unwrap();
        assert_eq!(units.len(), MAX_ZERO_WIDTH_LEN);
        assert!(!<Vec<()>>::ZERO_WIDTH);
        assert!(<[(); 3]>::ZERO_WIDTH);
        assert!(!<((), u8)>::ZERO_WIDTH);
    }

    #[test]
    fn maps_roundtrip() {
        let mut tree = BTreeMap::new();
        tree.insert(String::from("one"), 1i64);
        tree.insert(String::from("two"), 2);
        assert_roundtrip(&tree);
        assert_roundtrip(&BTreeMap::<u8, u8>::new());

        let mut hash = HashMap::new();
        hash.insert(3u32, vec![true, false]);
        hash.insert(4, vec![]);
        assert_roundtrip(&hash);
    }

    #[test]
    fn duplicate_keys_keep_the_last_value() {
        let pairs = vec![(1u32, 10u32), (2, 20), (1, 11)];
        let bytes = to_bytes(&pairs).unwrap();

        let tree: BTreeMap<u32, u32> = from_bytes(&bytes).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[&1], 11);

        let hash: HashMap<u32, u32> = resume_all(split(&bytes, 1));
        assert_eq!(hash.len(), 2);
        assert_eq!(hash[&1], 11);
    }

    #[test]
    fn map_describes_as_array_of_pairs() {
        assert_eq!(
            BTreeMap::<i32, String>::describe(),
            TypeDesc::array(TypeDesc::tuple(vec![i32::describe(), String::describe()]))
        );
    }

    #[test]
    fn sequence_descriptors() {
        assert_eq!(String::describe(), TypeDesc::array(TypeDesc::prim("char")));
        assert_eq!(
            <[i16; 4]>::describe(),
            TypeDesc::fixed_array(TypeDesc::prim("short"), 4)
        );
    }

    #[test]
    fn resume_after_complete_is_an_error() {
        let bytes = to_bytes(&vec![1u8]).unwrap();
        let mut state = Vec::<u8>::prepare();
        let mut src = Chunked::new(vec![bytes]);
        assert!(Vec::<u8>::resume(&mut src, &mut state).unwrap().is_ready());
        assert!(matches!(
            Vec::<u8>::resume(&mut src, &mut state),
            Err(CodecError::ResumeAfterComplete)
        ));
    }
}
