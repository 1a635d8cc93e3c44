//! Frames binários enviados ao painel remoto pelo sink UDP.
//!
//! Cada datagrama carrega um único frame:
//!
//! ```text
//! ┌──────┬─────┬──────┬───────────┬─────────────┐
//! │ 'H'  │ ver │ kind │ len (u32) │ body (len)  │
//! └──────┴─────┴──────┴───────────┴─────────────┘
//!   1 B    1 B   1 B     4 B LE      bincode
//! ```
//!
//! `kind` separa uma leitura emitida ([`Frame::Emission`]) do resumo enviado
//! quando a sessão termina ([`Frame::Summary`]). O painel usa o resumo para
//! saber que não virão mais leituras.

use crate::replay::{Emission, ReplayReport};

const FRAME_TAG: u8 = b'H';

/// Versão do layout. A v1 não tinha `kind` nem `len`.
pub const FRAME_VERSION: u8 = 2;

/// tag + versão + kind + len
pub const PREFIX_LEN: usize = 7;

/// Tipo de conteúdo do frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Emission = 1,
    Summary = 2,
}

impl TryFrom<u8> for FrameKind {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            1 => Ok(FrameKind::Emission),
            2 => Ok(FrameKind::Summary),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

/// Conteúdo de um datagrama do sink UDP.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Emission(Emission),
    Summary(ReplayReport),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Emission(_) => FrameKind::Emission,
            Frame::Summary(_) => FrameKind::Summary,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Datagrama com {0} bytes não comporta o prefixo de {PREFIX_LEN}")]
    Truncated(usize),

    #[error("Datagrama não é do Hydro Replay (tag 0x{0:02X})")]
    ForeignTag(u8),

    #[error("Layout v{0} não suportado (esperado v{FRAME_VERSION})")]
    UnsupportedVersion(u8),

    #[error("Tipo de frame desconhecido: {0}")]
    UnknownKind(u8),

    #[error("Corpo declarado com {declared} bytes, recebidos {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Corpo excede o limite do campo len ({0} bytes)")]
    Oversized(usize),

    #[error("Corpo inválido: {0}")]
    Body(#[from] bincode::Error),
}

/// Serializa o frame com prefixo e comprimento do corpo.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>, ProtocolError> {
    let body = match frame {
        Frame::Emission(e) => bincode::serialize(e)?,
        Frame::Summary(r) => bincode::serialize(r)?,
    };
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::Oversized(body.len()))?;

    let mut out = Vec::with_capacity(PREFIX_LEN + body.len());
    out.extend_from_slice(&[FRAME_TAG, FRAME_VERSION, frame.kind() as u8]);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Lê um datagrama completo. Bytes além do comprimento declarado são erro.
pub fn decode_frame(datagram: &[u8]) -> Result<Frame, ProtocolError> {
    let Some((prefix, body)) = datagram.split_first_chunk::<PREFIX_LEN>() else {
        return Err(ProtocolError::Truncated(datagram.len()));
    };
    let [tag, version, kind, len @ ..] = *prefix;

    if tag != FRAME_TAG {
        return Err(ProtocolError::ForeignTag(tag));
    }
    if version != FRAME_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    let kind = FrameKind::try_from(kind)?;

    let declared = u32::from_le_bytes(len) as usize;
    if declared != body.len() {
        return Err(ProtocolError::LengthMismatch {
            declared,
            actual: body.len(),
        });
    }

    Ok(match kind {
        FrameKind::Emission => Frame::Emission(bincode::deserialize(body)?),
        FrameKind::Summary => Frame::Summary(bincode::deserialize(body)?),
    })
}
