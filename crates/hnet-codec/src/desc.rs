use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Constructor codes in the binary descriptor form.
pub const PRIM: i32 = 0;
pub const FIXED_ARRAY: i32 = 4;
pub const ARRAY: i32 = 5;
pub const VARIANT: i32 = 6;
pub const RECORD: i32 = 7;

/// Nesting limit when decoding descriptors from untrusted bytes.
const MAX_DEPTH: usize = 64;

/// Field offset placeholder; layouts are computed by the receiver.
const NO_OFFSET: i32 = -1;

/// Structural description of a wire type.
///
/// Built by [`Codec::describe`](crate::Codec::describe) and exchanged in
/// binary form during the handshake so the server can check each binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// A named primitive, or an opaque alias when `rep` is present.
    Prim {
        name: String,
        rep: Option<Box<TypeDesc>>,
    },
    /// An enumeration with explicit enumerator values.
    Enum {
        name: String,
        ctors: Vec<(String, u32)>,
    },
    /// A tagged union; constructor order is significant.
    Variant(Vec<Ctor>),
    /// A record; field order is significant.
    Record(Vec<Field>),
    /// A sequence of `elem`, fixed-length when `len` is set.
    Array { elem: Box<TypeDesc>, len: Option<u64> },
}

/// One constructor of a [`TypeDesc::Variant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctor {
    pub name: String,
    pub tag: u32,
    pub payload: TypeDesc,
}

/// One field of a [`TypeDesc::Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeDesc,
}

impl TypeDesc {
    pub fn prim(name: impl Into<String>) -> Self {
        Self::Prim {
            name: name.into(),
            rep: None,
        }
    }

    pub fn unit() -> Self {
        Self::prim("unit")
    }

    /// An opaque alias `name` over the representation `rep`.
    pub fn alias(name: impl Into<String>, rep: TypeDesc) -> Self {
        Self::Prim {
            name: name.into(),
            rep: Some(Box::new(rep)),
        }
    }

    pub fn array(elem: TypeDesc) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len: None,
        }
    }

    pub fn fixed_array(elem: TypeDesc, len: u64) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len: Some(len),
        }
    }

    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, TypeDesc)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.into(),
                    ty,
                })
                .collect(),
        )
    }

    /// A record with positional field names `.f0`, `.f1`, ...
    ///
    /// An empty tuple is `unit`.
    pub fn tuple(elems: Vec<TypeDesc>) -> Self {
        if elems.is_empty() {
            return Self::unit();
        }
        Self::record(
            elems
                .into_iter()
                .enumerate()
                .map(|(i, ty)| (positional_name(i), ty)),
        )
    }

    /// A union whose constructor tags are the declared positions.
    ///
    /// A union with no constructors is uninhabited and describes as `void`.
    pub fn variant<N: Into<String>>(ctors: impl IntoIterator<Item = (N, TypeDesc)>) -> Self {
        let ctors: Vec<Ctor> = ctors
            .into_iter()
            .enumerate()
            .map(|(i, (name, payload))| Ctor {
                name: name.into(),
                tag: i as u32,
                payload,
            })
            .collect();
        if ctors.is_empty() {
            Self::prim("void")
        } else {
            Self::Variant(ctors)
        }
    }

    /// Binary form sent in the handshake.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst);
        dst.freeze()
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        match self {
            Self::Prim { name, rep } => {
                dst.put_i32_ne(PRIM);
                put_str(dst, name);
                match rep {
                    Some(rep) => {
                        dst.put_u8(1);
                        rep.encode_into(dst);
                    }
                    None => dst.put_u8(0),
                }
            }
            Self::Enum { ctors, .. } => {
                dst.put_i32_ne(VARIANT);
                dst.put_u64_ne(ctors.len() as u64);
                for (name, value) in ctors {
                    put_str(dst, name);
                    dst.put_i32_ne(*value as i32);
                    Self::unit().encode_into(dst);
                }
            }
            Self::Variant(ctors) => {
                dst.put_i32_ne(VARIANT);
                dst.put_u64_ne(ctors.len() as u64);
                for ctor in ctors {
                    put_str(dst, &ctor.name);
                    dst.put_i32_ne(ctor.tag as i32);
                    ctor.payload.encode_into(dst);
                }
            }
            Self::Record(fields) => {
                dst.put_i32_ne(RECORD);
                dst.put_u64_ne(fields.len() as u64);
                for field in fields {
                    put_str(dst, &field.name);
                    dst.put_i32_ne(NO_OFFSET);
                    field.ty.encode_into(dst);
                }
            }
            Self::Array { elem, len: Some(len) } => {
                dst.put_i32_ne(FIXED_ARRAY);
                elem.encode_into(dst);
                dst.put_u64_ne(*len);
            }
            Self::Array { elem, len: None } => {
                dst.put_i32_ne(ARRAY);
                elem.encode_into(dst);
            }
        }
    }

    /// Parse the binary form produced by [`TypeDesc::encode`].
    ///
    /// Enumerations come back as variants with unit payloads, which is how
    /// they travel.
    pub fn decode(mut src: &[u8]) -> Result<Self> {
        let desc = Self::decode_at(&mut src, 0)?;
        if src.has_remaining() {
            return Err(malformed(format!(
                "{} trailing bytes after descriptor",
                src.remaining()
            )));
        }
        Ok(desc)
    }

    fn decode_at(src: &mut &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {MAX_DEPTH}")));
        }
        match get_i32(src)? {
            PRIM => {
                let name = get_str(src)?;
                let rep = match get_u8(src)? {
                    0 => None,
                    _ => Some(Box::new(Self::decode_at(src, depth + 1)?)),
                };
                Ok(Self::Prim { name, rep })
            }
            FIXED_ARRAY => {
                let elem = Box::new(Self::decode_at(src, depth + 1)?);
                let len = get_u64(src)?;
                Ok(Self::Array {
                    elem,
                    len: Some(len),
                })
            }
            ARRAY => Ok(Self::array(Self::decode_at(src, depth + 1)?)),
            VARIANT => {
                let count = get_count(src)?;
                let mut ctors = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    let name = get_str(src)?;
                    let tag = get_i32(src)? as u32;
                    let payload = Self::decode_at(src, depth + 1)?;
                    ctors.push(Ctor { name, tag, payload });
                }
                Ok(Self::Variant(ctors))
            }
            RECORD => {
                let count = get_count(src)?;
                let mut fields = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    let name = get_str(src)?;
                    let _offset = get_i32(src)?;
                    let ty = Self::decode_at(src, depth + 1)?;
                    fields.push(Field { name, ty });
                }
                Ok(Self::Record(fields))
            }
            code => Err(malformed(format!("unknown type constructor code {code}"))),
        }
    }
}

/// Synthesized name of the `i`th positional field or constructor.
pub fn positional_name(i: usize) -> String {
    format!(".f{i}")
}

fn put_str(dst: &mut BytesMut, s: &str) {
    dst.put_u64_ne(s.len() as u64);
    dst.put_slice(s.as_bytes());
}

fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::MalformedDescriptor(msg.into())
}

fn need(src: &[u8], n: usize) -> Result<()> {
    if src.remaining() < n {
        return Err(malformed(format!(
            "truncated: need {n} bytes, {} left",
            src.remaining()
        )));
    }
    Ok(())
}

fn get_u8(src: &mut &[u8]) -> Result<u8> {
    need(src, 1)?;
    Ok(src.get_u8())
}

fn get_i32(src: &mut &[u8]) -> Result<i32> {
    need(src, 4)?;
    Ok(src.get_i32_ne())
}

fn get_u64(src: &mut &[u8]) -> Result<u64> {
    need(src, 8)?;
    Ok(src.get_u64_ne())
}

fn get_count(src: &mut &[u8]) -> Result<usize> {
    let count = get_u64(src)?;
    usize::try_from(count).map_err(|_| malformed(format!("count {count} out of range")))
}

fn get_str(src: &mut &[u8]) -> Result<String> {
    let len = get_count(src)?;
    need(src, len)?;
    let bytes = src.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| malformed("name is not valid UTF-8"))
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim { name, .. } => f.write_str(name),
            Self::Enum { name, .. } => f.write_str(name),
            Self::Variant(ctors) => {
                f.write_str("|")?;
                for (i, ctor) in ctors.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}:{}", ctor.name, ctor.payload)?;
                }
                f.write_str("|")
            }
            Self::Record(fields) if is_tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" * ")?;
                    }
                    write!(f, "{}", field.ty)?;
                }
                f.write_str(")")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}:{}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
            Self::Array { elem, len: Some(len) } => write!(f, "[:{elem}|{len}:]"),
            Self::Array { elem, len: None } => write!(f, "[{elem}]"),
        }
    }
}

fn is_tuple(fields: &[Field]) -> bool {
    fields
        .iter()
        .enumerate()
        .all(|(i, field)| field.name == positional_name(i))
}
