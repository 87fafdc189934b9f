//! The MessagePack codec.
//!
//! A container encodes as a two-entry map, `{"header": {..}, "values":
//! [..]}`, with the six header fields as strings and each value as a
//! three-entry map `{"name", "type", "data"}`. The `type` is the decimal
//! code as a string; `data` is the value's natural MessagePack encoding
//! (nil, bool, minimal-width integer, f32/f64, str, bin), and composites
//! carry their children as an array of value maps. Every length and integer
//! uses the shortest form the format allows, so equal containers produce
//! identical bytes regardless of producer.
//!
//! Decoding walks the bytes with a single cursor, dispatching on
//! [`rmp::Marker`], and validates every `data` against its declared type
//! code. The whole tree is reconstructed; nothing is dropped.
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::{from_msgpack, to_msgpack, Container, Value};
//!
//! let mut container = Container::with_message_type("sensor_frame");
//! container.add(Value::double("celsius", 21.5));
//! container.add(Value::bytes("frame", vec![0xFF, 0xD8]));
//!
//! let bytes = to_msgpack(&container).unwrap();
//! assert_eq!(from_msgpack(&bytes).unwrap(), container);
//! ```

use crate::value::integer_data;
use crate::{Container, Error, Result, Value, ValueData, ValueKind, MAX_DEPTH};
use rmp::encode::{
    write_array_len, write_bin, write_bool, write_f32, write_f64, write_map_len, write_nil,
    write_sint, write_str, write_uint,
};
use rmp::Marker;

impl From<rmp::encode::ValueWriteError> for Error {
    fn from(err: rmp::encode::ValueWriteError) -> Self {
        Error::Io(std::io::Error::from(err).to_string())
    }
}

/// Encodes a container to MessagePack bytes.
///
/// # Errors
///
/// Returns [`Error::Format`] if a value list or byte payload exceeds the
/// format's 32-bit length fields. Writing into the buffer itself cannot
/// fail.
pub fn to_msgpack(container: &Container) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(96 + 32 * container.len());
    write_map_len(&mut buf, 2)?;
    write_str(&mut buf, "header")?;
    write_map_len(&mut buf, 6)?;
    write_str(&mut buf, "source_id")?;
    write_str(&mut buf, container.source_id())?;
    write_str(&mut buf, "source_sub_id")?;
    write_str(&mut buf, container.source_sub_id())?;
    write_str(&mut buf, "target_id")?;
    write_str(&mut buf, container.target_id())?;
    write_str(&mut buf, "target_sub_id")?;
    write_str(&mut buf, container.target_sub_id())?;
    write_str(&mut buf, "message_type")?;
    write_str(&mut buf, container.message_type())?;
    write_str(&mut buf, "version")?;
    write_str(&mut buf, container.version())?;
    write_str(&mut buf, "values")?;
    write_values(&mut buf, container.values())?;
    Ok(buf)
}

/// Decodes MessagePack bytes into a container, header and full value tree.
///
/// Integer widths are not required to be minimal on input, but every
/// integer is range-checked against its declared kind. The outer map must
/// consume the input exactly.
///
/// # Errors
///
/// Returns [`Error::Parse`] for truncated input, a non-map outer structure,
/// data that does not match its declared type, nesting beyond
/// [`MAX_DEPTH`], or trailing bytes; [`Error::UnknownType`] for a type code
/// outside the table; [`Error::Range`] for integer data outside its
/// declared kind.
pub fn from_msgpack(input: &[u8]) -> Result<Container> {
    let mut decoder = Decoder::new(input);
    let container = decoder.container()?;
    if decoder.remaining() > 0 {
        return Err(Error::parse(decoder.position, "trailing bytes after container"));
    }
    Ok(container)
}

fn write_values(buf: &mut Vec<u8>, values: &[Value]) -> Result<()> {
    let len = u32::try_from(values.len())
        .map_err(|_| Error::format("value list exceeds the MessagePack length limit"))?;
    write_array_len(buf, len)?;
    for value in values {
        write_value(buf, value)?;
    }
    Ok(())
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    write_map_len(buf, 3)?;
    write_str(buf, "name")?;
    write_str(buf, value.name())?;
    write_str(buf, "type")?;
    write_str(buf, &value.kind().code().to_string())?;
    write_str(buf, "data")?;
    match value.data() {
        ValueData::Null => write_nil(buf)?,
        ValueData::Bool(flag) => write_bool(buf, *flag)?,
        ValueData::Short(n) => {
            write_sint(buf, i64::from(*n))?;
        }
        ValueData::Int(n) => {
            write_sint(buf, i64::from(*n))?;
        }
        ValueData::Long(n) => {
            write_sint(buf, i64::from(*n))?;
        }
        ValueData::LLong(n) => {
            write_sint(buf, *n)?;
        }
        ValueData::UShort(n) => {
            write_uint(buf, u64::from(*n))?;
        }
        ValueData::UInt(n) => {
            write_uint(buf, u64::from(*n))?;
        }
        ValueData::ULong(n) => {
            write_uint(buf, u64::from(*n))?;
        }
        ValueData::ULLong(n) => {
            write_uint(buf, *n)?;
        }
        ValueData::Float(number) => write_f32(buf, *number)?,
        ValueData::Double(number) => write_f64(buf, *number)?,
        ValueData::Bytes(bytes) => write_bin(buf, bytes)?,
        ValueData::String(text) => write_str(buf, text)?,
        ValueData::Container(children) | ValueData::Array(children) => {
            let len = u32::try_from(children.len())
                .map_err(|_| Error::format("value list exceeds the MessagePack length limit"))?;
            write_array_len(buf, len)?;
            for child in children {
                write_value(buf, child)?;
            }
        }
    }
    Ok(())
}

/// Forward-only cursor over the input bytes.
struct Decoder<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Decoder { input, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::parse(self.position, "unexpected end of input"));
        }
        let chunk = &self.input[self.position..self.position + len];
        self.position += len;
        Ok(chunk)
    }

    fn be_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn marker(&mut self) -> Result<Marker> {
        Ok(Marker::from_u8(self.take(1)?[0]))
    }

    fn len32(&mut self) -> Result<usize> {
        let len = u32::from_be_bytes(self.be_bytes()?);
        usize::try_from(len).map_err(|_| Error::parse(self.position, "length overflows this platform"))
    }

    fn map_len(&mut self) -> Result<usize> {
        let at = self.position;
        match self.marker()? {
            Marker::FixMap(n) => Ok(usize::from(n)),
            Marker::Map16 => Ok(usize::from(u16::from_be_bytes(self.be_bytes()?))),
            Marker::Map32 => self.len32(),
            _ => Err(Error::parse(at, "expected a map")),
        }
    }

    fn array_len(&mut self) -> Result<usize> {
        let at = self.position;
        match self.marker()? {
            Marker::FixArray(n) => Ok(usize::from(n)),
            Marker::Array16 => Ok(usize::from(u16::from_be_bytes(self.be_bytes()?))),
            Marker::Array32 => self.len32(),
            _ => Err(Error::parse(at, "expected an array")),
        }
    }

    fn str_len(&mut self, at: usize, marker: Marker) -> Result<usize> {
        match marker {
            Marker::FixStr(n) => Ok(usize::from(n)),
            Marker::Str8 => Ok(usize::from(u8::from_be_bytes(self.be_bytes()?))),
            Marker::Str16 => Ok(usize::from(u16::from_be_bytes(self.be_bytes()?))),
            Marker::Str32 => self.len32(),
            _ => Err(Error::parse(at, "expected a string")),
        }
    }

    fn bin_len(&mut self, at: usize, marker: Marker) -> Result<usize> {
        match marker {
            Marker::Bin8 => Ok(usize::from(u8::from_be_bytes(self.be_bytes()?))),
            Marker::Bin16 => Ok(usize::from(u16::from_be_bytes(self.be_bytes()?))),
            Marker::Bin32 => self.len32(),
            _ => Err(Error::parse(at, "expected binary data")),
        }
    }

    fn text(&mut self, at: usize, marker: Marker) -> Result<String> {
        let len = self.str_len(at, marker)?;
        let chunk = self.take(len)?;
        match std::str::from_utf8(chunk) {
            Ok(text) => Ok(text.to_owned()),
            Err(_) => Err(Error::parse(at, "invalid UTF-8 in string")),
        }
    }

    fn string(&mut self) -> Result<String> {
        let at = self.position;
        let marker = self.marker()?;
        self.text(at, marker)
    }

    /// Reads any integer marker's payload, widened for range checking.
    fn integer(&mut self, at: usize, marker: Marker) -> Result<i128> {
        Ok(match marker {
            Marker::FixPos(n) => i128::from(n),
            Marker::FixNeg(n) => i128::from(n),
            Marker::U8 => i128::from(u8::from_be_bytes(self.be_bytes()?)),
            Marker::U16 => i128::from(u16::from_be_bytes(self.be_bytes()?)),
            Marker::U32 => i128::from(u32::from_be_bytes(self.be_bytes()?)),
            Marker::U64 => i128::from(u64::from_be_bytes(self.be_bytes()?)),
            Marker::I8 => i128::from(i8::from_be_bytes(self.be_bytes()?)),
            Marker::I16 => i128::from(i16::from_be_bytes(self.be_bytes()?)),
            Marker::I32 => i128::from(i32::from_be_bytes(self.be_bytes()?)),
            Marker::I64 => i128::from(i64::from_be_bytes(self.be_bytes()?)),
            _ => return Err(Error::parse(at, "expected an integer")),
        })
    }

    fn container(&mut self) -> Result<Container> {
        let mut container = Container::new();
        let fields = self.map_len()?;
        for _ in 0..fields {
            let at = self.position;
            let key = self.string()?;
            match key.as_str() {
                "header" => self.header(&mut container)?,
                "values" => {
                    let count = self.array_len()?;
                    for _ in 0..count {
                        let value = self.value(0)?;
                        container.add(value);
                    }
                }
                _ => return Err(Error::parse(at, "unexpected key in container map")),
            }
        }
        Ok(container)
    }

    fn header(&mut self, container: &mut Container) -> Result<()> {
        let fields = self.map_len()?;
        for _ in 0..fields {
            let key = self.string()?;
            let text = self.string()?;
            match key.as_str() {
                "source_id" => container.source_id = text,
                "source_sub_id" => container.source_sub_id = text,
                "target_id" => container.target_id = text,
                "target_sub_id" => container.target_sub_id = text,
                "message_type" => container.message_type = text,
                "version" => container.version = text,
                _ => {}
            }
        }
        Ok(())
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth >= MAX_DEPTH {
            return Err(Error::parse(self.position, "nesting exceeds maximum depth"));
        }
        let at = self.position;
        let fields = self.map_len()?;
        if fields != 3 {
            return Err(Error::parse(at, "value map must have exactly name, type, data"));
        }
        self.expect_key("name")?;
        let name = self.string()?;
        self.expect_key("type")?;
        let token = self.string()?;
        let kind = ValueKind::from_tag(&token).ok_or_else(|| Error::unknown_type(&token))?;
        self.expect_key("data")?;
        self.data(name, kind, depth)
    }

    fn expect_key(&mut self, expected: &str) -> Result<()> {
        let at = self.position;
        let key = self.string()?;
        if key != expected {
            return Err(Error::parse(at, &format!("expected {:?} key in value map", expected)));
        }
        Ok(())
    }

    fn data(&mut self, name: String, kind: ValueKind, depth: usize) -> Result<Value> {
        if kind.is_composite() {
            let count = self.array_len()?;
            let mut children = Vec::with_capacity(count.min(self.remaining()));
            for _ in 0..count {
                children.push(self.value(depth + 1)?);
            }
            return Ok(match kind {
                ValueKind::Container => Value::container(name, children),
                _ => Value::array(name, children),
            });
        }
        let at = self.position;
        let marker = self.marker()?;
        match kind {
            ValueKind::Null => match marker {
                Marker::Null => Ok(Value::null(name)),
                _ => Err(self.mismatch(at, kind)),
            },
            ValueKind::Bool => match marker {
                Marker::True => Ok(Value::boolean(name, true)),
                Marker::False => Ok(Value::boolean(name, false)),
                _ => Err(self.mismatch(at, kind)),
            },
            ValueKind::Float => match marker {
                Marker::F32 => Ok(Value::float(name, f32::from_be_bytes(self.be_bytes()?))),
                Marker::F64 => {
                    // a genuine f32 widened to f64 narrows back exactly
                    let wide = f64::from_be_bytes(self.be_bytes()?);
                    let narrowed = wide as f32;
                    if f64::from(narrowed) == wide || wide.is_nan() {
                        Ok(Value::float(name, narrowed))
                    } else {
                        Err(self.mismatch(at, kind))
                    }
                }
                _ => Err(self.mismatch(at, kind)),
            },
            ValueKind::Double => match marker {
                Marker::F64 => Ok(Value::double(name, f64::from_be_bytes(self.be_bytes()?))),
                Marker::F32 => {
                    Ok(Value::double(name, f64::from(f32::from_be_bytes(self.be_bytes()?))))
                }
                _ => Err(self.mismatch(at, kind)),
            },
            ValueKind::Bytes => {
                let len = self.bin_len(at, marker)?;
                Ok(Value::bytes(name, self.take(len)?))
            }
            ValueKind::String => {
                let text = self.text(at, marker)?;
                Ok(Value::string(name, text))
            }
            // the eight integer kinds
            _ => {
                let raw = self.integer(at, marker)?;
                Ok(Value::new(name, integer_data(kind, raw)?))
            }
        }
    }

    fn mismatch(&self, at: usize, kind: ValueKind) -> Error {
        Error::parse(at, &format!("data does not match declared {} type", kind.type_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_container() -> Container {
        let mut c = Container::with_message_type("everything");
        c.set_source("src", "s1");
        c.set_target("dst", "t1");
        c.add(Value::null("nothing"));
        c.add(Value::boolean("flag", true));
        c.add(Value::short("small", -12));
        c.add(Value::ushort("usmall", 300));
        c.add(Value::int("count", -40_000));
        c.add(Value::uint("ucount", 70_000));
        c.add(Value::long("wide", -2_147_483_648).unwrap());
        c.add(Value::ulong("uwide", 4_294_967_295).unwrap());
        c.add(Value::llong("huge", i64::MIN));
        c.add(Value::ullong("uhuge", u64::MAX));
        c.add(Value::float("ratio", 1.5));
        c.add(Value::double("precise", -2.25));
        c.add(Value::bytes("blob", vec![0xFF, 0xD8, 0xFF, 0xE0]));
        c.add(Value::string("label", "hello"));
        c.add(Value::array(
            "group",
            vec![
                Value::int("a", 1),
                Value::container("inner", vec![Value::string("s", "x")]),
            ],
        ));
        c
    }

    // test-local mirror of the format's fixstr rule
    fn fixstr(out: &mut Vec<u8>, text: &str) {
        out.push(0xA0 | text.len() as u8);
        out.extend_from_slice(text.as_bytes());
    }

    #[test]
    fn test_empty_container_golden_bytes() {
        let mut expected = vec![0x82];
        fixstr(&mut expected, "header");
        expected.push(0x86);
        for (key, value) in [
            ("source_id", ""),
            ("source_sub_id", ""),
            ("target_id", ""),
            ("target_sub_id", ""),
            ("message_type", "data_container"),
            ("version", "1.0.0.0"),
        ] {
            fixstr(&mut expected, key);
            fixstr(&mut expected, value);
        }
        fixstr(&mut expected, "values");
        expected.push(0x90);

        assert_eq!(to_msgpack(&Container::new()).unwrap(), expected);
    }

    #[test]
    fn test_value_map_golden_bytes() {
        let mut buf = Vec::new();
        write_value(&mut buf, &Value::llong("n", 5)).unwrap();

        let mut expected = vec![0x83];
        fixstr(&mut expected, "name");
        fixstr(&mut expected, "n");
        fixstr(&mut expected, "type");
        fixstr(&mut expected, "8");
        fixstr(&mut expected, "data");
        expected.push(0x05); // positive fixint

        assert_eq!(buf, expected);
    }

    #[test]
    fn test_round_trip_full_container() {
        let c = full_container();
        let bytes = to_msgpack(&c).unwrap();
        assert_eq!(from_msgpack(&bytes).unwrap(), c);
    }

    #[test]
    fn test_equal_containers_encode_identically() {
        let a = to_msgpack(&full_container()).unwrap();
        let b = to_msgpack(&full_container()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_minimality() {
        let mut c = Container::new();
        c.add(Value::llong("n", 5));
        let small = to_msgpack(&c).unwrap();

        let mut c = Container::new();
        c.add(Value::llong("n", 5_000_000_000));
        let large = to_msgpack(&c).unwrap();

        // 5 rides in the marker byte; 5e9 needs a 64-bit payload
        assert_eq!(large.len(), small.len() + 8);
    }

    #[test]
    fn test_truncated_input() {
        let bytes = to_msgpack(&full_container()).unwrap();
        for cut in [1, 5, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(from_msgpack(&bytes[..cut]), Err(Error::Parse { .. })),
                "cut at {}",
                cut
            );
        }
        assert!(matches!(from_msgpack(&[]), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = to_msgpack(&Container::new()).unwrap();
        bytes.push(0xC0);
        let err = from_msgpack(&bytes).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_outer_structure_must_be_map() {
        let mut buf = Vec::new();
        write_array_len(&mut buf, 0).unwrap();
        assert!(matches!(from_msgpack(&buf), Err(Error::Parse { .. })));
    }

    fn frame_single_value(build: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut buf = Vec::new();
        write_map_len(&mut buf, 2).unwrap();
        write_str(&mut buf, "header").unwrap();
        write_map_len(&mut buf, 0).unwrap();
        write_str(&mut buf, "values").unwrap();
        write_array_len(&mut buf, 1).unwrap();
        build(&mut buf);
        buf
    }

    #[test]
    fn test_unknown_type_code() {
        let bytes = frame_single_value(|buf| {
            write_map_len(buf, 3).unwrap();
            write_str(buf, "name").unwrap();
            write_str(buf, "x").unwrap();
            write_str(buf, "type").unwrap();
            write_str(buf, "77").unwrap();
            write_str(buf, "data").unwrap();
            write_nil(buf).unwrap();
        });
        assert!(matches!(from_msgpack(&bytes), Err(Error::UnknownType(ref t)) if t == "77"));
    }

    #[test]
    fn test_integer_data_is_range_checked() {
        let bytes = frame_single_value(|buf| {
            write_map_len(buf, 3).unwrap();
            write_str(buf, "name").unwrap();
            write_str(buf, "n").unwrap();
            write_str(buf, "type").unwrap();
            write_str(buf, "2").unwrap(); // short
            write_str(buf, "data").unwrap();
            write_sint(buf, 70_000).unwrap();
        });
        assert!(matches!(from_msgpack(&bytes), Err(Error::Range { .. })));
    }

    #[test]
    fn test_data_marker_must_match_type() {
        let bytes = frame_single_value(|buf| {
            write_map_len(buf, 3).unwrap();
            write_str(buf, "name").unwrap();
            write_str(buf, "b").unwrap();
            write_str(buf, "type").unwrap();
            write_str(buf, "1").unwrap(); // bool
            write_str(buf, "data").unwrap();
            write_sint(buf, 5).unwrap();
        });
        let err = from_msgpack(&bytes).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_non_minimal_integers_still_decode() {
        // a 32-bit payload for a value that fits in a fixint
        let bytes = frame_single_value(|buf| {
            write_map_len(buf, 3).unwrap();
            write_str(buf, "name").unwrap();
            write_str(buf, "n").unwrap();
            write_str(buf, "type").unwrap();
            write_str(buf, "4").unwrap();
            write_str(buf, "data").unwrap();
            buf.push(0xD2); // int 32 marker
            buf.extend_from_slice(&7i32.to_be_bytes());
        });
        let c = from_msgpack(&bytes).unwrap();
        assert_eq!(c.get("n").unwrap().to_int().unwrap(), 7);
    }

    #[test]
    fn test_unknown_header_fields_are_ignored() {
        let mut buf = Vec::new();
        write_map_len(&mut buf, 2).unwrap();
        write_str(&mut buf, "header").unwrap();
        write_map_len(&mut buf, 2).unwrap();
        write_str(&mut buf, "message_type").unwrap();
        write_str(&mut buf, "m").unwrap();
        write_str(&mut buf, "extra").unwrap();
        write_str(&mut buf, "whatever").unwrap();
        write_str(&mut buf, "values").unwrap();
        write_array_len(&mut buf, 0).unwrap();

        let c = from_msgpack(&buf).unwrap();
        assert_eq!(c.message_type(), "m");
        assert!(c.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut buf = Vec::new();
        write_map_len(&mut buf, 2).unwrap();
        write_str(&mut buf, "header").unwrap();
        write_map_len(&mut buf, 0).unwrap();
        write_str(&mut buf, "values").unwrap();
        write_array_len(&mut buf, 1).unwrap();
        for _ in 0..=MAX_DEPTH {
            write_map_len(&mut buf, 3).unwrap();
            write_str(&mut buf, "name").unwrap();
            write_str(&mut buf, "n").unwrap();
            write_str(&mut buf, "type").unwrap();
            write_str(&mut buf, "15").unwrap();
            write_str(&mut buf, "data").unwrap();
            write_array_len(&mut buf, 1).unwrap();
        }
        let err = from_msgpack(&buf).unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn test_float_widths() {
        let mut c = Container::new();
        c.add(Value::float("f", 1.5));
        c.add(Value::double("d", 1.5));
        let bytes = to_msgpack(&c).unwrap();
        // f32 payload for Float, f64 payload for Double
        assert!(bytes.windows(5).any(|w| w == [0xCA, 0x3F, 0xC0, 0x00, 0x00]));
        assert!(bytes
            .windows(9)
            .any(|w| w == [0xCB, 0x3F, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]));
        assert_eq!(from_msgpack(&bytes).unwrap(), c);
    }

    #[test]
    fn test_float_from_f64_payload() {
        let widened = |value: f64| {
            frame_single_value(|buf| {
                write_map_len(buf, 3).unwrap();
                write_str(buf, "name").unwrap();
                write_str(buf, "f").unwrap();
                write_str(buf, "type").unwrap();
                write_str(buf, "10").unwrap(); // float
                write_str(buf, "data").unwrap();
                write_f64(buf, value).unwrap();
            })
        };

        // an f64 that is an exact f32 decodes
        let c = from_msgpack(&widened(f64::from(1.5f32))).unwrap();
        assert_eq!(c.get("f").unwrap().to_float().unwrap(), 1.5);
        let c = from_msgpack(&widened(f64::NAN)).unwrap();
        assert!(c.get("f").unwrap().to_float().unwrap().is_nan());

        // 1e300 would narrow to infinity; 0.1 would lose mantissa bits
        let err = from_msgpack(&widened(1e300)).unwrap_err();
        assert!(err.to_string().contains("does not match"));
        assert!(from_msgpack(&widened(0.1)).is_err());
    }
}
