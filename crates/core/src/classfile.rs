//! Reads the header of a JVM class file: names of the class, its superclass and its
//! interfaces, plus the access flags. Fields, methods and attributes are never touched.

use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),
    #[error("class file truncated at byte {0}")]
    Truncated(usize),
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u32 },
    #[error("constant pool index {0} does not name a class")]
    BadClassRef(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    /// Anything the header does not need, and the unusable slot after a long or double.
    Other,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self.pos.checked_add(n).ok_or(ClassFileError::Truncated(self.pos))?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(ClassFileError::Truncated(self.pos))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl ClassInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut r = Reader { bytes, pos: 0 };
        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let _minor = r.u16()?;
        let _major = r.u16()?;

        let count = u32::from(r.u16()?);
        // slot 0 is unused
        let mut pool = vec![Constant::Other];
        // wide enough for a Long or Double in the last slot
        let mut index: u32 = 1;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    Constant::Utf8(String::from_utf8_lossy(r.take(len)?).into_owned())
                }
                7 => Constant::Class(r.u16()?),
                8 | 16 | 19 | 20 => {
                    r.take(2)?;
                    Constant::Other
                }
                15 => {
                    r.take(3)?;
                    Constant::Other
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    r.take(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    r.take(8)?;
                    pool.push(Constant::Other);
                    index += 1;
                    Constant::Other
                }
                tag => return Err(ClassFileError::UnknownTag { tag, index }),
            };
            pool.push(constant);
            index += 1;
        }

        let access_flags = r.u16()?;
        let this_class = r.u16()?;
        let super_class = r.u16()?;
        let iface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(iface_count as usize);
        for _ in 0..iface_count {
            interfaces.push(class_name(&pool, r.u16()?)?);
        }

        Ok(ClassInfo {
            name: class_name(&pool, this_class)?,
            super_class: match super_class {
                0 => None,
                idx => Some(class_name(&pool, idx)?),
            },
            interfaces,
            access_flags,
        })
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    /// Instantiable classes only; interfaces and abstract classes cannot be dropped on a diagram.
    pub fn is_concrete(&self) -> bool {
        !self.is_interface() && !self.is_abstract()
    }

    /// All direct supertypes, superclass first.
    pub fn supertypes(&self) -> Vec<String> {
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .cloned()
            .collect()
    }
}

fn class_name(pool: &[Constant], index: u16) -> Result<String, ClassFileError> {
    let Some(Constant::Class(name_index)) = pool.get(index as usize) else {
        return Err(ClassFileError::BadClassRef(index));
    };
    match pool.get(*name_index as usize) {
        Some(Constant::Utf8(internal)) => Ok(internal.replace('/', ".")),
        _ => Err(ClassFileError::BadClassRef(index)),
    }
}
