use alloc::string::ToString;

/// The class of a tag, identifying its category.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Class {
    /// Types defined in X.680.
    Universal = 0,
    /// Application specific types.
    Application,
    /// Context specific types (e.g. fields in a struct)
    Context,
    /// Private types.
    Private,
}

impl Class {
    /// Instantiate a `Class` from the two class bits of an identifier octet.
    pub const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::Context,
            _ => Class::Private,
        }
    }

    /// Returns whether the given class is universal.
    pub fn is_universal(self) -> bool {
        self == Class::Universal
    }
}

impl core::fmt::Display for Class {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            Self::Universal => "universal",
            Self::Application => "application",
            Self::Context => "context",
            Self::Private => "private",
        })
    }
}

/// A complete DER identifier: class, constructed bit, and tag number.
///
/// Unlike an abstract ASN.1 tag the constructed bit is part of the
/// identity, because DER reading must distinguish e.g. the primitive
/// `[2]` of a `dNSName` from the constructed `[2]` of an implicitly
/// tagged SEQUENCE.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Tag {
    /// The class of the tag.
    pub class: Class,
    /// The tag number.
    pub number: u32,
    /// Whether the encoding is constructed rather than primitive.
    pub constructed: bool,
}

macro_rules! consts {
    ($($name:ident = ($value:expr, $constructed:expr)),+ $(,)?) => {
        #[allow(missing_docs)]
        impl Tag {
            $(
                pub const $name: Tag =
                    Tag::new(Class::Universal, $value, $constructed);
            )+
        }
    }
}

consts! {
    BOOLEAN = (1, false),
    INTEGER = (2, false),
    BIT_STRING = (3, false),
    OCTET_STRING = (4, false),
    NULL = (5, false),
    OBJECT_IDENTIFIER = (6, false),
    UTF8_STRING = (12, false),
    SEQUENCE = (16, true),
    SET = (17, true),
    PRINTABLE_STRING = (19, false),
    TELETEX_STRING = (20, false),
    IA5_STRING = (22, false),
    UTC_TIME = (23, false),
    GENERALIZED_TIME = (24, false),
    UNIVERSAL_STRING = (28, false),
    BMP_STRING = (30, false),
}

impl Tag {
    /// Creates a tag from its parts.
    pub const fn new(class: Class, number: u32, constructed: bool) -> Self {
        Self {
            class,
            number,
            constructed,
        }
    }

    /// A primitive context-specific tag, e.g. the `[2]` of a `dNSName`.
    pub const fn context(number: u32) -> Self {
        Self::new(Class::Context, number, false)
    }

    /// A constructed context-specific tag, e.g. the `[0]` of an EXPLICIT
    /// version field.
    pub const fn context_constructed(number: u32) -> Self {
        Self::new(Class::Context, number, true)
    }

    /// Returns the same tag with the constructed bit set.
    pub const fn to_constructed(self) -> Self {
        Self::new(self.class, self.number, true)
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self.class {
            Class::Universal => "Universal",
            Class::Application => "Application",
            Class::Context => "Context",
            Class::Private => "Private",
        })?;
        f.write_str(" ")?;
        f.write_str(&self.number.to_string())?;
        if self.constructed {
            f.write_str(" (constructed)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_from_bits() {
        assert_eq!(Class::from_bits(0), Class::Universal);
        assert_eq!(Class::from_bits(1), Class::Application);
        assert_eq!(Class::from_bits(2), Class::Context);
        assert_eq!(Class::from_bits(3), Class::Private);
    }

    #[test]
    fn context_tags_differ_by_constructed_bit() {
        assert_ne!(Tag::context(2), Tag::context_constructed(2));
        assert_eq!(Tag::context(2).to_constructed(), Tag::context_constructed(2));
    }
}
