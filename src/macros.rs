// ABOUTME: This module provides macros to reduce boilerplate in SMPP PDU implementations
// ABOUTME: Includes macros for header-only PDUs and fluent builder setters

/// Macro for implementing codec traits on header-only PDUs (no body)
///
/// # Arguments
/// * `$pdu_type` - The PDU struct name (e.g., EnquireLink)
/// * `$command_id` - The CommandId variant (e.g., CommandId::EnquireLink)
///
/// The struct must carry `command_status` and `sequence_number` fields.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn command_id() -> $crate::datatypes::CommandId {
                $command_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let header = $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                };
                header.encode(buf);
                Ok(())
            }
        }
    };
}

/// Macro for generating constructor methods for header-only PDUs
///
/// # Generated code
/// - `new(sequence_number: u32)` - Creates PDU with Ok status
/// - `error(sequence_number: u32, status: CommandStatus)` - Creates PDU with error status
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec implementation plus `new`/`error` constructors for a header-only PDU
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Macro for generating builder setter methods
///
/// For each `field: Type` pair, generates
/// ```ignore
/// pub fn field(mut self, field: Type) -> Self {
///     self.field = field;
///     self
/// }
/// ```
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

pub(crate) use {
    builder_setters, impl_complete_header_only_pdu, impl_header_only_constructors,
    impl_header_only_pdu,
};
