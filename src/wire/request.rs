use bson::Document;

use crate::matcher::json::match_json;
use crate::wire::error::WireParserError;
use crate::wire::flags::{OpDeleteFlags, OpInsertFlags, OpMsgFlags, OpQueryFlags, OpUpdateFlags};
use crate::wire::msg_header::MsgHeader;
use crate::wire::opcodes::OpCode;
use crate::wire::ops::op::MongoOp;
use crate::wire::ops::op_delete::parse_op_delete;
use crate::wire::ops::op_get_more::parse_op_get_more;
use crate::wire::ops::op_insert::parse_op_insert;
use crate::wire::ops::op_kill_cursors::parse_op_kill_cursors;
use crate::wire::ops::op_msg::{parse_op_msg, Section};
use crate::wire::ops::op_query::parse_op_query;
use crate::wire::ops::op_update::parse_op_update;

const COMMAND_NAMESPACE_SUFFIX: &str = ".$cmd";

/// One decoded client message. Immutable once constructed; every embedded
/// document is an owned copy, independent of the receive buffer.
#[derive(Debug)]
pub struct Request {
    pub header: MsgHeader,
    pub op: MongoOp,
    is_command: bool,
    command_name: Option<String>,
    as_str: String,
}

impl Request {
    /// Decodes the opcode-specific body of a message. The standard header
    /// is parsed by the caller (see `wire::parser::parse_incoming_bytes`).
    pub fn decode(header: MsgHeader, body: &[u8]) -> Result<Request, WireParserError> {
        let op = match header.op_code {
            OpCode::OpQuery => MongoOp::Query(parse_op_query(body)?),
            OpCode::OpInsert => MongoOp::Insert(parse_op_insert(body)?),
            OpCode::OpUpdate => MongoOp::Update(parse_op_update(body)?),
            OpCode::OpDelete => MongoOp::Delete(parse_op_delete(body)?),
            OpCode::OpGetMore => MongoOp::GetMore(parse_op_get_more(body)?),
            OpCode::OpKillCursors => MongoOp::KillCursors(parse_op_kill_cursors(body)?),
            OpCode::OpMsg => MongoOp::Msg(parse_op_msg(body)?),
            OpCode::OpCompressed => MongoOp::Compressed,
            OpCode::OpReply => {
                return Err(WireParserError::UnimplementedOpCode(header.op_code));
            }
        };
        Ok(Request::from_op(header, op))
    }

    fn from_op(header: MsgHeader, op: MongoOp) -> Request {
        let is_command = match &op {
            MongoOp::Msg(_) => true,
            MongoOp::Query(op) => is_command_namespace(&op.full_collection_name),
            MongoOp::Insert(op) => is_command_namespace(&op.full_collection_name),
            MongoOp::Update(op) => is_command_namespace(&op.full_collection_name),
            MongoOp::Delete(op) => is_command_namespace(&op.full_collection_name),
            MongoOp::GetMore(op) => is_command_namespace(&op.full_collection_name),
            MongoOp::KillCursors(_) | MongoOp::Compressed => false,
        };
        let as_str = render_op(&op);
        let mut request = Request {
            header,
            op,
            is_command,
            command_name: None,
            as_str,
        };
        let command_name = {
            let documents = request.documents();
            documents
                .first()
                .and_then(|document| document.keys().next())
                .map(|key| key.to_string())
        };
        request.command_name = command_name;
        if is_command && request.command_name.is_none() {
            eprintln!("WARNING: no command name in {}", request.as_str);
        }
        request
    }

    pub fn opcode(&self) -> OpCode {
        self.header.op_code
    }

    /// Every embedded document in decode order: query then projection,
    /// selector then update spec, concatenated inserts, or OP_MSG section
    /// documents.
    pub fn documents(&self) -> Vec<&Document> {
        match &self.op {
            MongoOp::Query(op) => {
                let mut documents = vec![&op.query];
                if let Some(selector) = &op.return_fields_selector {
                    documents.push(selector);
                }
                documents
            }
            MongoOp::Insert(op) => op.documents.iter().collect(),
            MongoOp::Update(op) => vec![&op.selector, &op.update],
            MongoOp::Delete(op) => vec![&op.selector],
            MongoOp::Msg(op) => {
                let mut documents = Vec::new();
                for section in &op.sections {
                    match section {
                        Section::Body(document) => documents.push(document),
                        Section::Sequence(sequence) => documents.extend(sequence.documents.iter()),
                    }
                }
                documents
            }
            MongoOp::GetMore(_) | MongoOp::KillCursors(_) | MongoOp::Compressed => Vec::new(),
        }
    }

    /// Panics when out of range; callers always know their opcode's arity.
    pub fn nth_document(&self, n: usize) -> &Document {
        let documents = self.documents();
        match documents.get(n) {
            Some(&document) => document,
            None => panic!(
                "requested document {} of a request carrying {}: {}",
                n,
                documents.len(),
                self.as_str
            ),
        }
    }

    pub fn cursor_ids(&self) -> Vec<i64> {
        match &self.op {
            MongoOp::GetMore(op) => vec![op.cursor_id],
            MongoOp::KillCursors(op) => op.cursor_ids.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.is_command
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command_name.as_deref()
    }

    /// Human-readable rendering of the request, built once during decode.
    pub fn as_str(&self) -> &str {
        &self.as_str
    }

    pub fn matches_query(
        &self,
        ns: &str,
        flags: OpQueryFlags,
        skip: i32,
        n_return: i32,
        query_json: Option<&str>,
        fields_json: Option<&str>,
        is_command: bool,
    ) -> bool {
        let op = match &self.op {
            MongoOp::Query(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_QUERY: {}", self.as_str);
                return false;
            }
        };
        if !match_json(Some(&op.query), is_command, query_json.unwrap_or("")) {
            return false;
        }
        if !match_json(
            op.return_fields_selector.as_ref(),
            false,
            fields_json.unwrap_or(""),
        ) {
            return false;
        }
        if self.is_command && !is_command {
            eprintln!("expected query, got command: {}", self.as_str);
            return false;
        }
        if !self.is_command && is_command {
            eprintln!("expected command, got query: {}", self.as_str);
            return false;
        }
        if op.full_collection_name != ns {
            eprintln!(
                "request namespace is '{}', expected '{}'",
                op.full_collection_name, ns
            );
            return false;
        }
        if op.flags != flags {
            eprintln!("request query flags are {}, expected {}", op.flags, flags);
            return false;
        }
        if op.number_to_skip != skip {
            eprintln!(
                "request skip = {}, expected {}",
                op.number_to_skip, skip
            );
            return false;
        }
        // quirk: commands from simple command helpers use n_return 1,
        // topology scanners use n_return -1
        let n_return_equal =
            op.number_to_return == n_return || (op.number_to_return.abs() == 1 && n_return == 1);
        if !n_return_equal {
            eprintln!(
                "request n_return = {}, expected {}",
                op.number_to_return, n_return
            );
            return false;
        }
        true
    }

    pub fn matches_insert(&self, ns: &str, flags: OpInsertFlags, docs_json: &[&str]) -> bool {
        let op = match &self.op {
            MongoOp::Insert(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_INSERT: {}", self.as_str);
                return false;
            }
        };
        if op.full_collection_name != ns {
            eprintln!(
                "request namespace is '{}', expected '{}'",
                op.full_collection_name, ns
            );
            return false;
        }
        if op.flags != flags {
            eprintln!("request insert flags are {}, expected {}", op.flags, flags);
            return false;
        }
        if op.documents.len() != docs_json.len() {
            eprintln!(
                "expected {} documents in request, got {}",
                docs_json.len(),
                op.documents.len()
            );
            return false;
        }
        for (document, pattern) in op.documents.iter().zip(docs_json.iter()) {
            if !match_json(Some(document), false, pattern) {
                return false;
            }
        }
        true
    }

    pub fn matches_update(
        &self,
        ns: &str,
        flags: OpUpdateFlags,
        selector_json: &str,
        update_json: &str,
    ) -> bool {
        let op = match &self.op {
            MongoOp::Update(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_UPDATE: {}", self.as_str);
                return false;
            }
        };
        if op.full_collection_name != ns {
            eprintln!(
                "request namespace is '{}', expected '{}'",
                op.full_collection_name, ns
            );
            return false;
        }
        if op.flags != flags {
            eprintln!("request update flags are {}, expected {}", op.flags, flags);
            return false;
        }
        match_json(Some(&op.selector), false, selector_json)
            && match_json(Some(&op.update), false, update_json)
    }

    pub fn matches_delete(&self, ns: &str, flags: OpDeleteFlags, selector_json: &str) -> bool {
        let op = match &self.op {
            MongoOp::Delete(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_DELETE: {}", self.as_str);
                return false;
            }
        };
        if op.full_collection_name != ns {
            eprintln!(
                "request namespace is '{}', expected '{}'",
                op.full_collection_name, ns
            );
            return false;
        }
        if op.flags != flags {
            eprintln!("request delete flags are {}, expected {}", op.flags, flags);
            return false;
        }
        match_json(Some(&op.selector), false, selector_json)
    }

    pub fn matches_get_more(&self, ns: &str, n_return: i32, cursor_id: i64) -> bool {
        let op = match &self.op {
            MongoOp::GetMore(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_GETMORE: {}", self.as_str);
                return false;
            }
        };
        if op.full_collection_name != ns {
            eprintln!(
                "request namespace is '{}', expected '{}'",
                op.full_collection_name, ns
            );
            return false;
        }
        if op.number_to_return != n_return {
            eprintln!(
                "request n_return = {}, expected {}",
                op.number_to_return, n_return
            );
            return false;
        }
        if op.cursor_id != cursor_id {
            eprintln!(
                "request cursor_id {}, expected {}",
                op.cursor_id, cursor_id
            );
            return false;
        }
        true
    }

    /// The protocol allows multiple cursor ids but only one is supported;
    /// a request carrying more is a contract violation and panics.
    pub fn matches_kill_cursors(&self, cursor_id: i64) -> bool {
        let op = match &self.op {
            MongoOp::KillCursors(op) => op,
            _ => {
                eprintln!(
                    "request opcode does not match OP_KILLCURSORS: {}",
                    self.as_str
                );
                return false;
            }
        };
        if op.cursor_ids.len() != 1 {
            panic!(
                "request has {} cursor ids, only a single cursor id is supported",
                op.cursor_ids.len()
            );
        }
        if op.cursor_ids[0] != cursor_id {
            eprintln!(
                "request cursor_id {}, expected {}",
                op.cursor_ids[0], cursor_id
            );
            return false;
        }
        true
    }

    /// The documents in the message are compared pairwise to the patterns;
    /// the first pattern is matched as a command.
    pub fn matches_msg(&self, flags: OpMsgFlags, patterns: &[&str]) -> bool {
        let op = match &self.op {
            MongoOp::Msg(op) => op,
            _ => {
                eprintln!("request opcode does not match OP_MSG: {}", self.as_str);
                return false;
            }
        };
        let documents = self.documents();
        for (index, pattern) in patterns.iter().enumerate() {
            match documents.get(index) {
                None => {
                    eprintln!(
                        "expected at least {} documents in request, got {}",
                        index + 1,
                        documents.len()
                    );
                    return false;
                }
                Some(&document) => {
                    if !match_json(Some(document), index == 0, pattern) {
                        return false;
                    }
                }
            }
        }
        if patterns.len() < documents.len() {
            eprintln!(
                "expected {} documents in request, got {}",
                patterns.len(),
                documents.len()
            );
            return false;
        }
        if op.flag_bits != flags {
            eprintln!(
                "expected OP_MSG flags {}, got {}",
                flags, op.flag_bits
            );
            return false;
        }
        true
    }
}

fn is_command_namespace(ns: &str) -> bool {
    ns.len() > COMMAND_NAMESPACE_SUFFIX.len() && ns.ends_with(COMMAND_NAMESPACE_SUFFIX)
}

fn render_op(op: &MongoOp) -> String {
    match op {
        MongoOp::Query(op) => {
            let mut out = format!("OP_QUERY {} {}", op.full_collection_name, op.query);
            if let Some(selector) = &op.return_fields_selector {
                out.push_str(&format!(" fields={}", selector));
            }
            out.push_str(&format!(" flags={}", op.flags));
            if op.number_to_skip != 0 {
                out.push_str(&format!(" skip={}", op.number_to_skip));
            }
            if op.number_to_return != 0 {
                out.push_str(&format!(" n_return={}", op.number_to_return));
            }
            out
        }
        MongoOp::Insert(op) => {
            let documents: Vec<String> = op
                .documents
                .iter()
                .map(|document| document.to_string())
                .collect();
            format!(
                "OP_INSERT {} {} flags={}",
                op.documents.len(),
                documents.join(", "),
                op.flags
            )
        }
        MongoOp::Update(op) => {
            format!(
                "OP_UPDATE {}, {} flags={}",
                op.selector, op.update, op.flags
            )
        }
        MongoOp::Delete(op) => format!("OP_DELETE {} flags={}", op.selector, op.flags),
        MongoOp::GetMore(op) => format!(
            "OP_GETMORE {} {} n_return={}",
            op.full_collection_name, op.cursor_id, op.number_to_return
        ),
        MongoOp::KillCursors(op) => {
            let ids: Vec<String> = op.cursor_ids.iter().map(|id| id.to_string()).collect();
            format!("OP_KILLCURSORS {}", ids.join(" "))
        }
        MongoOp::Msg(op) => {
            let mut out = String::from("OP_MSG");
            for (index, section) in op.sections.iter().enumerate() {
                out.push_str(if index > 0 { ", " } else { " " });
                match section {
                    Section::Body(document) => out.push_str(&document.to_string()),
                    Section::Sequence(sequence) => {
                        let documents: Vec<String> = sequence
                            .documents
                            .iter()
                            .map(|document| document.to_string())
                            .collect();
                        out.push_str(&format!(
                            "{}: [{}]",
                            sequence.identifier,
                            documents.join(", ")
                        ));
                    }
                }
            }
            out
        }
        MongoOp::Compressed => String::from("OP_COMPRESSED"),
    }
}
