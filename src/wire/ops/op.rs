use crate::wire::ops::op_delete::OpDelete;
use crate::wire::ops::op_get_more::OpGetMore;
use crate::wire::ops::op_insert::OpInsert;
use crate::wire::ops::op_kill_cursors::OpKillCursors;
use crate::wire::ops::op_msg::OpMsg;
use crate::wire::ops::op_query::OpQuery;
use crate::wire::ops::op_update::OpUpdate;

#[derive(Debug)]
pub enum MongoOp {
    Query(OpQuery),
    Insert(OpInsert),
    Update(OpUpdate),
    Delete(OpDelete),
    GetMore(OpGetMore),
    KillCursors(OpKillCursors),
    Msg(OpMsg),
    // carried with no documents; decompression is the caller's job
    Compressed,
}
